use crate::fdt::{self, FdtHeader};
use crate::smbios::{self, EntryPoint, SMBIOS2_ENTRY_SIZE, SMBIOS3_ENTRY_SIZE, Structures};
use crate::{PlatVar, acpi_table_vars, flag};
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use firmware_acpi::walk::{ROOT_POINTER_GUIDS, find_root, visit};
use firmware_acpi::{ConfigTableRegistry, PhysMapRo, PhysReader};
use firmware_rangecheck::RangeCheckError;
use log::{debug, warn};
use uefi::table::cfg::{SMBIOS_GUID, SMBIOS3_GUID};
use uefi::{Guid, guid};

/// Configuration table GUID of a flattened device tree blob.
pub const FDT_GUID: Guid = guid!("b1b621d5-f19c-41a5-830b-d9152c69aae0");

const BIOS_STRINGS: [&str; 3] = [
    "pvar-smbios-bios-vendor",
    "pvar-smbios-bios-ver",
    "pvar-smbios-bios-date",
];

const SYSTEM_STRINGS: [&str; 6] = [
    "pvar-smbios-manufacturer",
    "pvar-smbios-product",
    "pvar-smbios-product-ver",
    "pvar-smbios-product-sn",
    "pvar-smbios-product-sku",
    "pvar-smbios-product-family",
];

/// Addresses of the firmware tables the platform advertises.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Firmware {
    pub acpi: Option<u64>,
    pub smbios: Option<u64>,
    pub smbios3: Option<u64>,
    pub fdt: Option<u64>,
}

impl Firmware {
    pub fn from_registry(registry: &impl ConfigTableRegistry) -> Self {
        Self {
            acpi: find_root(registry, &ROOT_POINTER_GUIDS),
            smbios: registry.lookup(&SMBIOS_GUID),
            smbios3: registry.lookup(&SMBIOS3_GUID),
            fdt: registry.lookup(&FDT_GUID),
        }
    }
}

/// Every variable describing `firmware`. Tables that fail validation are
/// logged and contribute nothing beyond their presence flag.
pub fn collect<M: PhysMapRo>(reader: &PhysReader<'_, M>, firmware: &Firmware) -> Vec<PlatVar> {
    let mut vars = Vec::new();

    vars.push(flag("pvar-have-smbios", firmware.smbios.is_some()));
    if let Some(address) = firmware.smbios {
        smbios_vars(reader, address, false, &mut vars);
    }

    vars.push(flag("pvar-have-smbios64", firmware.smbios3.is_some()));
    if let Some(address) = firmware.smbios3 {
        smbios_vars(reader, address, true, &mut vars);
    }

    vars.push(flag("pvar-have-acpi", firmware.acpi.is_some()));
    if let Some(rsdp) = firmware.acpi {
        let walked = visit(reader, rsdp, |table| match table.bytes(reader) {
            Ok(bytes) => vars.extend(acpi_table_vars(&table.header, bytes)),
            Err(e) => warn!("Table {} @ {:#x}: {e}", table.signature(), table.address),
        });
        if let Err(e) = walked {
            warn!("ACPI tables not exported: {e}");
        }
    }

    vars.push(flag("pvar-have-fdt", firmware.fdt.is_some()));
    if let Some(address) = firmware.fdt {
        fdt_vars(reader, address, &mut vars);
    }

    vars
}

fn smbios_vars<M: PhysMapRo>(
    reader: &PhysReader<'_, M>,
    address: u64,
    v3: bool,
    vars: &mut Vec<PlatVar>,
) {
    let size = if v3 { SMBIOS3_ENTRY_SIZE } else { SMBIOS2_ENTRY_SIZE };
    let entry = match reader.read(address, size) {
        Ok(bytes) if v3 => EntryPoint::parse_v3(bytes),
        Ok(bytes) => EntryPoint::parse_v2(bytes),
        Err(e) => {
            warn!("SMBIOS entry point @ {address:#x}: {e}");
            return;
        }
    };
    let Some(entry) = entry else {
        warn!("No SMBIOS anchor @ {address:#x}");
        return;
    };
    if entry.table_length == 0 {
        return;
    }

    let table = if entry.bounded {
        mapped_prefix(reader, entry.table_address, entry.table_length)
    } else {
        reader.read(entry.table_address, entry.table_length)
    };
    let table = match table {
        Ok(table) => table,
        Err(e) => {
            warn!("SMBIOS table @ {:#x}: {e}", entry.table_address);
            return;
        }
    };
    let table = if entry.bounded {
        &table[..smbios::table3_length(table, entry.table_length).min(table.len())]
    } else {
        table
    };

    for structure in Structures::new(table) {
        let names: &[&str] = match structure.kind {
            0 => &BIOS_STRINGS,
            1 => &SYSTEM_STRINGS,
            _ => continue,
        };
        for (number, &name) in (1u8..).zip(names) {
            if let Some(value) = structure.string(number) {
                vars.push(PlatVar::new(name, text(value)));
            }
        }
    }
}

/// Maps `[address, address + max)`, or as much of its start as the memory
/// map covers. The SMBIOS 3 maximum size is only an upper bound and may run
/// past the end of mapped memory.
fn mapped_prefix<'a, M: PhysMapRo>(
    reader: &PhysReader<'a, M>,
    address: u64,
    max: usize,
) -> Result<&'a [u8], RangeCheckError> {
    match reader.read(address, max) {
        Err(RangeCheckError::NotMapped { first_missing, .. }) if first_missing > address => {
            let covered = usize::try_from(first_missing - address).map_or(max, |c| c.min(max));
            debug!("SMBIOS 3 table @ {address:#x}: {covered:#x} of {max:#x} bytes mapped");
            reader.read(address, covered)
        }
        other => other,
    }
}

fn fdt_vars<M: PhysMapRo>(reader: &PhysReader<'_, M>, address: u64, vars: &mut Vec<PlatVar>) {
    let header = match reader.read(address, fdt::HEADER_SIZE) {
        Ok(bytes) => FdtHeader::parse(bytes),
        Err(e) => {
            warn!("FDT header @ {address:#x}: {e}");
            return;
        }
    };
    let Some(header) = header.filter(FdtHeader::is_valid) else {
        warn!("Invalid FDT header @ {address:#x}");
        return;
    };

    let blob = match reader.read(address, header.total_size as usize) {
        Ok(blob) => blob,
        Err(e) => {
            warn!("FDT @ {address:#x} (0x{:x} bytes): {e}", header.total_size);
            return;
        }
    };
    let Some(root) = fdt::root_info(blob) else {
        warn!("Could not parse the FDT root node");
        return;
    };

    if let Some(model) = root.model {
        vars.push(PlatVar::new("pvar-fdt-model", text(model)));
    }
    let mut count = 0;
    for (index, compatible) in root.compatible.iter().enumerate() {
        vars.push(PlatVar::new(
            format!("pvar-fdt-compatible-{index}"),
            text(compatible),
        ));
        count += 1;
    }
    vars.push(PlatVar::new(
        "pvar-fdt-compatible-count",
        format!("{count}"),
    ));
}

/// Firmware strings as printable ASCII.
fn text(raw: &[u8]) -> String {
    raw.iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                char::from(b)
            } else {
                '?'
            }
        })
        .collect()
}
