/// Typed device properties.
///
/// Every device item carries one [`Property`] per [`PropertyClass`] in a
/// dense array. A property always has a fixed type tag (its class decides
/// it) and may be invalid when the enumerator had no value for that class.
/// Invalid properties are not errors: they display empty, sort last and
/// never match a search.
use super::display;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

/// Type tag of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    String,
    StringList,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Guid,
    Boolean,
    TimeStamp,
    Binary,
    StatusCode,
}

/// A property value. The variant is the type tag.
///
/// `TimeStamp` holds FILETIME ticks (100 ns intervals since 1601-01-01 UTC).
/// `StatusCode` holds an NTSTATUS-style signed code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    StringList(Vec<String>),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    Guid(Uuid),
    Boolean(bool),
    TimeStamp(i64),
    Binary(Vec<u8>),
    StatusCode(i32),
}

impl PropertyValue {
    /// The type tag of this value.
    pub fn kind(&self) -> PropertyType {
        match self {
            Self::String(_) => PropertyType::String,
            Self::StringList(_) => PropertyType::StringList,
            Self::UInt32(_) => PropertyType::UInt32,
            Self::Int32(_) => PropertyType::Int32,
            Self::UInt64(_) => PropertyType::UInt64,
            Self::Int64(_) => PropertyType::Int64,
            Self::Guid(_) => PropertyType::Guid,
            Self::Boolean(_) => PropertyType::Boolean,
            Self::TimeStamp(_) => PropertyType::TimeStamp,
            Self::Binary(_) => PropertyType::Binary,
            Self::StatusCode(_) => PropertyType::StatusCode,
        }
    }

    /// Render the value as display text.
    fn render(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::StringList(list) => list.join(", "),
            Self::UInt32(v) => v.to_string(),
            Self::Int32(v) => v.to_string(),
            Self::UInt64(v) => v.to_string(),
            Self::Int64(v) => v.to_string(),
            Self::Guid(g) => display::format_guid(g),
            Self::Boolean(b) => b.to_string(),
            Self::TimeStamp(ticks) => display::format_filetime(*ticks),
            Self::Binary(bytes) => display::format_binary(bytes),
            Self::StatusCode(code) => format!("0x{:08X}", *code as u32),
        }
    }
}

/// The fixed set of property classes a device item exposes.
///
/// The discriminant is the index into the item's property array, so an
/// out-of-range class cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertyClass {
    Name,
    Manufacturer,
    Service,
    Class,
    EnumeratorName,
    InstallDate,
    FirstInstallDate,
    LastArrivalDate,
    LastRemovalDate,
    DeviceDesc,
    FriendlyName,
    InstanceId,
    ParentInstanceId,
    PdoName,
    LocationInfo,
    ClassGuid,
    Driver,
    DriverVersion,
    DriverDate,
    FirmwareVersion,
    HasProblem,
    ProblemCode,
    ProblemStatus,
    DevNodeStatus,
    DevCapabilities,
    UpperFilters,
    LowerFilters,
    HardwareIds,
    CompatibleIds,
    ConfigFlags,
    UiNumber,
    BusTypeGuid,
    BusNumber,
    Security,
    Address,
    ExtendedAddress,
    PowerData,
    RemovalPolicy,
    InstallState,
    LocationPaths,
    ContainerId,
    IsPresent,
    InterfaceEnabled,
    ReportedDeviceIdsHash,
    IsRebootRequired,
    DriverRank,
    SessionId,
}

impl PropertyClass {
    /// Number of property classes (length of every item's property array).
    pub const COUNT: usize = 47;

    /// Every class in index order.
    pub const ALL: [PropertyClass; Self::COUNT] = [
        Self::Name,
        Self::Manufacturer,
        Self::Service,
        Self::Class,
        Self::EnumeratorName,
        Self::InstallDate,
        Self::FirstInstallDate,
        Self::LastArrivalDate,
        Self::LastRemovalDate,
        Self::DeviceDesc,
        Self::FriendlyName,
        Self::InstanceId,
        Self::ParentInstanceId,
        Self::PdoName,
        Self::LocationInfo,
        Self::ClassGuid,
        Self::Driver,
        Self::DriverVersion,
        Self::DriverDate,
        Self::FirmwareVersion,
        Self::HasProblem,
        Self::ProblemCode,
        Self::ProblemStatus,
        Self::DevNodeStatus,
        Self::DevCapabilities,
        Self::UpperFilters,
        Self::LowerFilters,
        Self::HardwareIds,
        Self::CompatibleIds,
        Self::ConfigFlags,
        Self::UiNumber,
        Self::BusTypeGuid,
        Self::BusNumber,
        Self::Security,
        Self::Address,
        Self::ExtendedAddress,
        Self::PowerData,
        Self::RemovalPolicy,
        Self::InstallState,
        Self::LocationPaths,
        Self::ContainerId,
        Self::IsPresent,
        Self::InterfaceEnabled,
        Self::ReportedDeviceIdsHash,
        Self::IsRebootRequired,
        Self::DriverRank,
        Self::SessionId,
    ];

    /// Index into the dense property array.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a class by array index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The type tag every property of this class carries.
    pub fn property_type(self) -> PropertyType {
        use PropertyType as T;
        match self {
            Self::Name
            | Self::Manufacturer
            | Self::Service
            | Self::Class
            | Self::EnumeratorName
            | Self::DeviceDesc
            | Self::FriendlyName
            | Self::InstanceId
            | Self::ParentInstanceId
            | Self::PdoName
            | Self::LocationInfo
            | Self::Driver
            | Self::DriverVersion
            | Self::FirmwareVersion => T::String,
            Self::UpperFilters
            | Self::LowerFilters
            | Self::HardwareIds
            | Self::CompatibleIds
            | Self::LocationPaths => T::StringList,
            Self::InstallDate
            | Self::FirstInstallDate
            | Self::LastArrivalDate
            | Self::LastRemovalDate
            | Self::DriverDate => T::TimeStamp,
            Self::ClassGuid | Self::BusTypeGuid | Self::ContainerId => T::Guid,
            Self::HasProblem | Self::IsPresent | Self::InterfaceEnabled | Self::IsRebootRequired => {
                T::Boolean
            }
            Self::ProblemCode
            | Self::DevNodeStatus
            | Self::DevCapabilities
            | Self::ConfigFlags
            | Self::UiNumber
            | Self::BusNumber
            | Self::Address
            | Self::RemovalPolicy
            | Self::InstallState
            | Self::ReportedDeviceIdsHash
            | Self::DriverRank
            | Self::SessionId => T::UInt32,
            Self::ExtendedAddress => T::UInt64,
            Self::ProblemStatus => T::StatusCode,
            Self::Security | Self::PowerData => T::Binary,
        }
    }
}

/// One typed property of a device item.
///
/// The display string is rendered on first use and cached, so repeated
/// cell-text and search requests do not re-format the value.
#[derive(Debug, Clone)]
pub struct Property {
    kind: PropertyType,
    value: Option<PropertyValue>,
    display: OnceLock<String>,
}

impl Property {
    /// Create a valid property. The value's tag must match `kind`.
    pub fn new(kind: PropertyType, value: PropertyValue) -> Self {
        debug_assert_eq!(kind, value.kind(), "property value tag mismatch");
        Self {
            kind,
            value: Some(value),
            display: OnceLock::new(),
        }
    }

    /// Create an invalid (absent / unsupported) property of the given type.
    pub fn invalid(kind: PropertyType) -> Self {
        Self {
            kind,
            value: None,
            display: OnceLock::new(),
        }
    }

    /// The fixed type tag.
    #[inline]
    pub fn kind(&self) -> PropertyType {
        self.kind
    }

    /// `false` when the enumerator had no value for this property.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }

    /// The raw value, if valid.
    #[inline]
    pub fn value(&self) -> Option<&PropertyValue> {
        self.value.as_ref()
    }

    /// Cached display string. Empty for invalid properties.
    pub fn as_str(&self) -> &str {
        self.display
            .get_or_init(|| self.value.as_ref().map(PropertyValue::render).unwrap_or_default())
    }

    /// Boolean value; invalid or non-boolean properties read as `false`.
    pub fn as_bool(&self) -> bool {
        matches!(self.value, Some(PropertyValue::Boolean(true)))
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self.value {
            Some(PropertyValue::UInt32(v)) => Some(v),
            _ => None,
        }
    }

    pub fn as_guid(&self) -> Option<Uuid> {
        match self.value {
            Some(PropertyValue::Guid(g)) => Some(g),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<i64> {
        match self.value {
            Some(PropertyValue::TimeStamp(t)) => Some(t),
            _ => None,
        }
    }

    /// String list value; empty for invalid or non-list properties.
    pub fn as_string_list(&self) -> &[String] {
        match &self.value {
            Some(PropertyValue::StringList(list)) => list,
            _ => &[],
        }
    }
}
