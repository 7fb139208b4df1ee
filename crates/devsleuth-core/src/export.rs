/// CSV export of the device view.
///
/// Writes what the user sees: visible rows in display order, visible
/// columns in column order, with the column titles as the header.
use crate::adapter::{cell_text, DeviceTreeAdapter};
use crate::error::{DevSleuthError, Result};
use crate::model::PropertyClass;
use crate::query::column;
use crate::snapshot::{NodeIndex, Snapshot};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Write `nodes` as CSV rows of `columns`. Returns the number of rows.
pub fn write_rows<W: Write>(
    writer: W,
    snapshot: &Snapshot,
    nodes: &[NodeIndex],
    columns: &[PropertyClass],
) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(columns.iter().map(|&class| column(class).title))?;
    for &node in nodes {
        let item = snapshot.item(node);
        csv.write_record(columns.iter().map(|&class| cell_text(item, class)))?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(nodes.len())
}

/// Export the adapter's current view to `path`.
pub fn export_view(adapter: &DeviceTreeAdapter, path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path).map_err(|source| DevSleuthError::ExportIo {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = match adapter.snapshot() {
        Some(snapshot) => write_rows(
            file,
            snapshot,
            &adapter.display_order(),
            adapter.columns().visible(),
        )?,
        None => write_rows(file, &Snapshot::empty(), &[], adapter.columns().visible())?,
    };
    info!(path = %path.display(), rows, "Device view exported");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::DeviceTreeAdapter;
    use crate::model::{DeviceItem, PropertyValue, RawTree};
    use crate::query::{ColumnSet, SortState};
    use crate::settings::TreeConfig;
    use crate::snapshot::build;
    use std::sync::Arc;

    fn snapshot() -> Snapshot {
        let mut raw = RawTree::with_capacity(2);
        let root = raw.add_root(
            DeviceItem::new("ROOT", false)
                .with_property(PropertyClass::Name, PropertyValue::String("Computer".into())),
        );
        raw.add_child(
            root,
            DeviceItem::new("PCI\\VEN_1", false)
                .with_property(PropertyClass::Name, PropertyValue::String("Bridge, \"PCI\"".into()))
                .with_property(PropertyClass::IsPresent, PropertyValue::Boolean(true)),
        );
        build(Arc::new(raw), &TreeConfig::default())
    }

    #[test]
    fn test_write_rows_quotes_fields() {
        let snapshot = snapshot();
        let nodes: Vec<_> = snapshot.node_indices().collect();
        let mut out = Vec::new();
        let rows = write_rows(
            &mut out,
            &snapshot,
            &nodes,
            &[PropertyClass::Name, PropertyClass::InstanceId],
        )
        .unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Name,Instance ID"));
        assert!(text.contains("\"Bridge, \"\"PCI\"\"\",PCI\\VEN_1"));
        assert!(text.contains("Computer,ROOT"));
    }

    #[test]
    fn test_write_rows_header_only() {
        let mut out = Vec::new();
        let rows = write_rows(&mut out, &Snapshot::empty(), &[], &[PropertyClass::Name]).unwrap();
        assert_eq!(rows, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "Name\n");
    }

    #[test]
    fn test_export_view_reports_target_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing").join("devices.csv");
        let adapter = DeviceTreeAdapter::new(
            Arc::new(TreeConfig::default()),
            ColumnSet::default(),
            SortState::default(),
            false,
        );

        let err = export_view(&adapter, &path).unwrap_err();
        assert!(matches!(err, DevSleuthError::ExportIo { ref path, .. } if path.ends_with("devices.csv")));
        assert!(err.to_string().contains("devices.csv"));
    }
}
