/// Side panels for DevSleuth.

pub mod details_panel;
