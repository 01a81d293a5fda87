mod common;

use common::{FakePhys, MemRegistry, VecSource, fadt, facs, root_table, rsdp, sdt};
use firmware_acpi::walk::{ROOT_POINTER_GUIDS, expand_fadt, find_root, iterate, visit};
use firmware_acpi::{PhysReader, Signature, TableOrigin, WalkError};
use firmware_rangecheck::RangeCheck;
use uefi::table::cfg::{ACPI_GUID, ACPI2_GUID};

const RSDP: u64 = 0x1_0000;
const RSDT: u64 = 0x2_0000;
const XSDT: u64 = 0x3_0000;

fn session(phys: &FakePhys) -> RangeCheck {
    RangeCheck::open(&mut VecSource(phys.map_entries()), true, true).unwrap()
}

fn signatures<M: firmware_acpi::PhysMapRo>(reader: &PhysReader<'_, M>) -> Vec<Signature> {
    let mut seen = Vec::new();
    visit(reader, RSDP, |t| seen.push(t.signature())).unwrap();
    seen
}

/// RSDP, XSDT and one table per signature at 0x10000-spaced addresses.
fn firmware(tables: &[&[u8; 4]]) -> (FakePhys, Vec<u64>) {
    let mut phys = FakePhys::default();
    let addresses: Vec<u64> = (0..tables.len() as u64).map(|i| 0x10_0000 + i * 0x1_0000).collect();
    for (&sig, &address) in tables.iter().zip(&addresses) {
        phys.place(address, sdt(sig, 1, 8));
    }
    phys.place(RSDP, rsdp(2, 0, XSDT));
    phys.place(XSDT, root_table(b"XSDT", &addresses));
    (phys, addresses)
}

#[test]
fn null_entries_are_skipped() {
    let mut phys = FakePhys::default();
    for (i, sig) in [b"APIC", b"HPET", b"MCFG"].into_iter().enumerate() {
        phys.place(0x10_0000 + i as u64 * 0x1_0000, sdt(sig, 1, 4));
    }
    phys.place(RSDP, rsdp(2, 0, XSDT));
    phys.place(
        XSDT,
        root_table(b"XSDT", &[0x10_0000, 0, 0x11_0000, 0x12_0000]),
    );

    let rc = session(&phys);
    let reader = unsafe { PhysReader::new(&phys, &rc) };
    let tables: Vec<_> = iterate(&reader, RSDP).unwrap().collect();

    assert_eq!(tables.len(), 3);
    assert_eq!(
        tables.iter().map(|t| t.address).collect::<Vec<_>>(),
        [0x10_0000, 0x11_0000, 0x12_0000]
    );
    assert!(tables.iter().all(|t| t.origin == TableOrigin::Root));
    assert_eq!(tables[1].signature(), Signature(*b"HPET"));
}

#[test]
fn xsdt_wins_over_rsdt() {
    let mut phys = FakePhys::default();
    phys.place(0x10_0000, sdt(b"LEGA", 1, 0));
    phys.place(0x11_0000, sdt(b"MODN", 1, 0));
    phys.place(RSDP, rsdp(2, u32::try_from(RSDT).unwrap(), XSDT));
    phys.place(RSDT, root_table(b"RSDT", &[0x10_0000]));
    phys.place(XSDT, root_table(b"XSDT", &[0x11_0000]));

    let rc = session(&phys);
    let reader = unsafe { PhysReader::new(&phys, &rc) };
    assert_eq!(signatures(&reader), [Signature(*b"MODN")]);
    assert!(!phys.was_read(RSDT));
    assert!(!phys.was_read(0x10_0000));
}

#[test]
fn acpi1_uses_the_rsdt() {
    let mut phys = FakePhys::default();
    phys.place(0x10_0000, sdt(b"LEGA", 1, 0));
    phys.place(RSDP, rsdp(0, u32::try_from(RSDT).unwrap(), 0));
    phys.place(RSDT, root_table(b"RSDT", &[0x10_0000]));

    let rc = session(&phys);
    let reader = unsafe { PhysReader::new(&phys, &rc) };
    assert_eq!(signatures(&reader), [Signature(*b"LEGA")]);
}

#[test]
fn unmapped_and_corrupt_tables_are_skipped() {
    let (mut phys, _) = firmware(&[b"APIC"]);
    // Claims far more bytes than the page it sits on.
    let mut long = sdt(b"LONG", 1, 0);
    long[4..8].copy_from_slice(&0x2000u32.to_le_bytes());
    phys.place(0x20_0000, long);
    // Shorter than its own header.
    let mut short = sdt(b"SHRT", 1, 0);
    short[4..8].copy_from_slice(&10u32.to_le_bytes());
    phys.place(0x21_0000, short);
    phys.place(
        XSDT,
        root_table(b"XSDT", &[0x20_0000, 0xdead_0000, 0x21_0000, 0x10_0000]),
    );

    let rc = session(&phys);
    let reader = unsafe { PhysReader::new(&phys, &rc) };
    assert_eq!(signatures(&reader), [Signature(*b"APIC")]);
    assert!(!phys.was_read(0xdead_0000));
}

#[test]
fn walks_are_independent() {
    let (phys, addresses) = firmware(&[b"APIC", b"SSDT"]);
    let rc = session(&phys);
    let reader = unsafe { PhysReader::new(&phys, &rc) };

    let mut walk = iterate(&reader, RSDP).unwrap();
    assert_eq!(walk.next().map(|t| t.address), Some(addresses[0]));

    let again: Vec<u64> = iterate(&reader, RSDP).unwrap().map(|t| t.address).collect();
    assert_eq!(again, addresses);
    assert_eq!(walk.next().map(|t| t.address), Some(addresses[1]));
    assert!(walk.next().is_none());
}

#[test]
fn fadt_children_follow_the_fadt() {
    const FADT: u64 = 0x40_0000;
    const DSDT: u64 = 0x41_0000;
    const FACS: u64 = 0x42_0000;
    const STALE: u32 = 0x43_0000;

    let (mut phys, mut addresses) = firmware(&[b"APIC"]);
    phys.place(FADT, fadt(6, 276, STALE, 0, DSDT, FACS));
    phys.place(DSDT, sdt(b"DSDT", 2, 32));
    phys.place(FACS, facs());
    addresses.insert(0, FADT);
    phys.place(XSDT, root_table(b"XSDT", &addresses));

    let rc = session(&phys);
    let reader = unsafe { PhysReader::new(&phys, &rc) };

    let mut seen = Vec::new();
    visit(&reader, RSDP, |t| seen.push((t.signature(), t.origin, t.address))).unwrap();
    assert_eq!(
        seen,
        [
            (Signature::FADT, TableOrigin::Root, FADT),
            (Signature::DSDT, TableOrigin::Fadt, DSDT),
            (Signature::FACS, TableOrigin::Fadt, FACS),
            (Signature(*b"APIC"), TableOrigin::Root, addresses[1]),
        ]
    );
    assert!(!phys.was_read(u64::from(STALE)));
}

#[test]
fn old_fadt_uses_legacy_pointers() {
    const FADT: u64 = 0x40_0000;
    const DSDT: u64 = 0x41_0000;

    let mut phys = FakePhys::default();
    phys.place(FADT, fadt(2, 244, u32::try_from(DSDT).unwrap(), 0, 0x4400_0000, 0));
    phys.place(DSDT, sdt(b"DSDT", 1, 0));
    phys.place(RSDP, rsdp(2, 0, XSDT));
    phys.place(XSDT, root_table(b"XSDT", &[FADT]));

    let rc = session(&phys);
    let reader = unsafe { PhysReader::new(&phys, &rc) };
    let table = iterate(&reader, RSDP).unwrap().next().unwrap();
    let children = expand_fadt(&reader, &table);

    assert_eq!(children.dsdt.map(|t| t.address), Some(DSDT));
    assert!(children.facs.is_none());
}

#[test]
fn unmapped_fadt_child_is_none() {
    const FADT: u64 = 0x40_0000;

    let mut phys = FakePhys::default();
    phys.place(FADT, fadt(6, 276, 0, 0, 0x7777_0000, 0));
    phys.place(RSDP, rsdp(2, 0, XSDT));
    phys.place(XSDT, root_table(b"XSDT", &[FADT]));

    let rc = session(&phys);
    let reader = unsafe { PhysReader::new(&phys, &rc) };
    assert_eq!(signatures(&reader), [Signature::FADT]);
}

#[test]
fn root_failures() {
    let mut phys = FakePhys::default();
    let mut bad = rsdp(2, 0, XSDT);
    bad[0] = b'X';
    phys.place(RSDP, bad);
    phys.place(0x5_0000, rsdp(2, 0, 0));

    let rc = session(&phys);
    let reader = unsafe { PhysReader::new(&phys, &rc) };
    assert_eq!(
        visit(&reader, RSDP, |_| {}),
        Err(WalkError::BadRootSignature(RSDP))
    );
    assert_eq!(
        visit(&reader, 0x9_0000, |_| {}),
        Err(WalkError::RootNotMapped(0x9_0000))
    );
    assert_eq!(visit(&reader, 0x5_0000, |_| {}), Err(WalkError::NoRootTable));
}

#[test]
fn bad_rsdp_checksum_is_tolerated() {
    let (mut phys, addresses) = firmware(&[b"APIC"]);
    let mut raw = rsdp(2, 0, XSDT);
    raw[8] = raw[8].wrapping_add(1);
    phys.place(RSDP, raw);

    let rc = session(&phys);
    let reader = unsafe { PhysReader::new(&phys, &rc) };
    let found: Vec<u64> = iterate(&reader, RSDP).unwrap().map(|t| t.address).collect();
    assert_eq!(found, addresses);
}

#[test]
fn disabled_session_still_walks() {
    let (phys, addresses) = firmware(&[b"APIC", b"SSDT"]);
    let rc = RangeCheck::disabled();
    let reader = unsafe { PhysReader::new(&phys, &rc) };
    let found: Vec<u64> = iterate(&reader, RSDP).unwrap().map(|t| t.address).collect();
    assert_eq!(found, addresses);
}

#[test]
fn root_lookup_order() {
    let mut registry = MemRegistry::default();
    assert_eq!(find_root(&registry, &ROOT_POINTER_GUIDS), None);

    registry.entries.push((ACPI_GUID, 0x1000));
    assert_eq!(find_root(&registry, &ROOT_POINTER_GUIDS), Some(0x1000));

    registry.entries.push((ACPI2_GUID, 0x2000));
    assert_eq!(find_root(&registry, &ROOT_POINTER_GUIDS), Some(0x2000));
}
