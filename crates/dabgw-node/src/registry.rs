use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use dabgw_transport::tcp::TcpEndpoint;
use dabgw_transport::LinkError;

use crate::device::Device;
use crate::strategy::{AisStrategy, BusStrategy, EthernetStrategy, Strategy};

/// Interface kinds as encoded in the registry source.
pub const INTERFACE_AIS: u8 = 0;
pub const INTERFACE_I2C: u8 = 1;
pub const INTERFACE_ETHERNET: u8 = 2;
pub const INTERFACE_SPI: u8 = 3;

/// Bus device path used for I2C companions.
#[cfg(target_os = "linux")]
const I2C_BUS_PATH: &str = "/dev/i2c-1";

/// One configuration row describing a transport endpoint.
///
/// `address`/`setting` are interpreted per interface kind: serial path +
/// baud for AIS, target address for I2C, host + port for Ethernet, bus +
/// chip-select for SPI.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRecord {
    pub name: String,
    pub branch: String,
    pub model: String,
    pub technology: String,
    pub priority: i32,
    pub interface_type: u8,
    pub address: String,
    pub setting: u32,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// Fewer than one usable device row: fatal configuration error.
    #[error("device registry holds no devices")]
    Empty,
    #[error("unknown interface type {0}")]
    UnknownInterfaceType(u8),
    #[error("link setup for device {device} failed: {reason}")]
    Link { device: String, reason: String },
}

/// Loads device rows from a CSV file.
///
/// Fewer than one data row is a fatal configuration error; startup must
/// stop rather than continue with zero devices.
pub fn load_records(path: &Path) -> Result<Vec<DeviceRecord>, RegistryError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    if records.is_empty() {
        return Err(RegistryError::Empty);
    }
    Ok(records)
}

fn link_error(record: &DeviceRecord, err: LinkError) -> RegistryError {
    RegistryError::Link {
        device: record.name.clone(),
        reason: err.to_string(),
    }
}

/// Builds one device with its real transport link bound.
pub fn build_device(record: &DeviceRecord) -> Result<Device, RegistryError> {
    let strategy = match record.interface_type {
        INTERFACE_AIS => {
            let link = dabgw_transport::serial::SerialLink::open(&record.address, record.setting)
                .map_err(|err| link_error(record, err))?;
            Strategy::Ais(AisStrategy::new(Box::new(link)))
        }
        INTERFACE_I2C => {
            #[cfg(target_os = "linux")]
            {
                let target = record.address.trim().parse::<u16>().map_err(|_| {
                    RegistryError::Link {
                        device: record.name.clone(),
                        reason: "i2c address is not a number".to_string(),
                    }
                })?;
                let link = dabgw_transport::i2c::I2cLink::open(I2C_BUS_PATH, target)
                    .map_err(|err| link_error(record, err))?;
                Strategy::I2c(BusStrategy::new(Box::new(link)))
            }
            #[cfg(not(target_os = "linux"))]
            {
                return Err(RegistryError::Link {
                    device: record.name.clone(),
                    reason: "i2c links require a linux host".to_string(),
                });
            }
        }
        INTERFACE_ETHERNET => {
            let port = u16::try_from(record.setting).map_err(|_| RegistryError::Link {
                device: record.name.clone(),
                reason: "port does not fit u16".to_string(),
            })?;
            Strategy::Ethernet(EthernetStrategy::new(Box::new(TcpEndpoint::new(
                record.address.clone(),
                port,
            ))))
        }
        INTERFACE_SPI => {
            #[cfg(target_os = "linux")]
            {
                let bus = record.address.trim().parse::<u8>().map_err(|_| {
                    RegistryError::Link {
                        device: record.name.clone(),
                        reason: "spi bus is not a number".to_string(),
                    }
                })?;
                let link = dabgw_transport::spi::SpiLink::open(bus, record.setting as u8)
                    .map_err(|err| link_error(record, err))?;
                Strategy::Spi(BusStrategy::new(Box::new(link)))
            }
            #[cfg(not(target_os = "linux"))]
            {
                return Err(RegistryError::Link {
                    device: record.name.clone(),
                    reason: "spi links require a linux host".to_string(),
                });
            }
        }
        other => return Err(RegistryError::UnknownInterfaceType(other)),
    };

    Ok(Device::new(
        record.name.clone(),
        record.branch.clone(),
        record.model.clone(),
        record.technology.clone(),
        record.priority,
        strategy,
    ))
}

/// Source of freshly built devices for one acknowledgment attempt.
///
/// The registry is re-read per attempt so configuration edits and
/// re-plugged links are picked up without a restart.
pub trait DeviceSource: Send + Sync {
    fn load(&self) -> Result<Vec<Device>, RegistryError>;
}

/// CSV-file-backed device source.
pub struct CsvDeviceSource {
    path: PathBuf,
}

impl CsvDeviceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Startup validation: the registry must parse and hold at least one
    /// row. Returns the row count.
    pub fn validate(&self) -> Result<usize, RegistryError> {
        load_records(&self.path).map(|records| records.len())
    }
}

impl DeviceSource for CsvDeviceSource {
    fn load(&self) -> Result<Vec<Device>, RegistryError> {
        let records = load_records(&self.path)?;
        let mut devices = Vec::new();
        for record in &records {
            match build_device(record) {
                Ok(device) => devices.push(device),
                // One unpluggable link must not take down the others.
                Err(err) => warn!("skipping device {}: {err}", record.name),
            }
        }
        Ok(devices)
    }
}

#[cfg(test)]
mod tests {
    use super::{build_device, load_records, CsvDeviceSource, DeviceRecord, DeviceSource, RegistryError};
    use crate::strategy::StrategyKind;
    use std::path::PathBuf;

    fn temp_csv(name: &str, contents: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let pid = std::process::id();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock should be monotonic enough for tests")
            .as_nanos();
        path.push(format!("dabgw-registry-{name}-{pid}-{nanos}.csv"));
        std::fs::write(&path, contents).expect("csv fixture should write");
        path
    }

    const HEADER: &str = "name,branch,model,technology,priority,interface_type,address,setting\n";

    fn ethernet_record() -> DeviceRecord {
        DeviceRecord {
            name: "backhaul".to_string(),
            branch: "Pycom".to_string(),
            model: "FiPy".to_string(),
            technology: "Wifi".to_string(),
            priority: 1,
            interface_type: 2,
            address: "10.0.0.2".to_string(),
            setting: 9000,
        }
    }

    #[test]
    fn load_parses_rows_in_order() {
        let path = temp_csv(
            "rows",
            &format!(
                "{HEADER}backhaul,Pycom,FiPy,Wifi,1,2,10.0.0.2,9000\n\
                 transponder,True Heading,Base Station,VHF,3,0,/dev/ttyUSB0,38400\n"
            ),
        );
        let records = load_records(&path).expect("registry should load");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "backhaul");
        assert_eq!(records[1].interface_type, 0);
        assert_eq!(records[1].setting, 38400);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn empty_registry_is_fatal() {
        let path = temp_csv("empty", HEADER);
        assert!(matches!(load_records(&path), Err(RegistryError::Empty)));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn unknown_interface_type_is_rejected() {
        let record = DeviceRecord {
            interface_type: 9,
            ..ethernet_record()
        };
        assert!(matches!(
            build_device(&record),
            Err(RegistryError::UnknownInterfaceType(9))
        ));
    }

    #[test]
    fn ethernet_device_builds_without_touching_the_network() {
        let device = build_device(&ethernet_record()).expect("device should build");
        assert_eq!(device.strategy_kind(), StrategyKind::Ethernet);
        assert_eq!(device.priority, 1);
        assert_eq!(device.technology, "Wifi");
    }

    #[test]
    fn source_skips_devices_whose_links_cannot_open() {
        // The serial row points at a path that does not exist; the
        // ethernet row still builds.
        let path = temp_csv(
            "partial",
            &format!(
                "{HEADER}backhaul,Pycom,FiPy,Wifi,1,2,10.0.0.2,9000\n\
                 transponder,True Heading,Base Station,VHF,3,0,/dev/does-not-exist,38400\n"
            ),
        );
        let devices = CsvDeviceSource::new(&path).load().expect("load should succeed");
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "backhaul");
        let _ = std::fs::remove_file(path);
    }
}
