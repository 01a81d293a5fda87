//! Builds a table tree with the store and walks it back like a consumer would.

mod common;

use common::{HeapPages, IdentityMap, MemRegistry, VecSource, facs, fadt, sdt};
use firmware_acpi::walk::{ROOT_POINTER_GUIDS, find_root, visit};
use firmware_acpi::{AcpiTableStore, PhysReader, Signature, StoreConfig, TableOrigin, sum};
use firmware_rangecheck::RangeCheck;

#[test]
fn walk_sees_what_the_store_built() {
    let (allocator, log) = HeapPages::new();
    let mut store = AcpiTableStore::new(allocator, StoreConfig {
        xsdt_block_entries: 2,
        ..StoreConfig::default()
    })
    .unwrap();
    let mut registry = MemRegistry::default();

    store.add(&sdt(b"DSDT", 2, 256), true).unwrap();
    store.add(&sdt(b"APIC", 1, 40), true).unwrap();
    store.add(&facs(), false).unwrap();
    store.add(&fadt(6, 276, 0, 0, 0, 0), true).unwrap();
    store.add(&sdt(b"SSDT", 1, 0), true).unwrap();
    store.publish(&mut registry).unwrap();

    let rsdp = find_root(&registry, &ROOT_POINTER_GUIDS).unwrap();
    assert_eq!(rsdp, store.rsdp_address());

    // Only memory the store allocated is "mapped".
    let map = log.borrow().map_entries();
    let rc = RangeCheck::open(&mut VecSource(map), true, true).unwrap();
    let reader = unsafe { PhysReader::new(&IdentityMap, &rc) };

    let mut seen = Vec::new();
    visit(&reader, rsdp, |table| {
        let bytes = table.bytes(&reader).unwrap();
        if table.signature() != Signature::FACS {
            assert_eq!(sum(bytes), 0, "{} checksum", table.signature());
        }
        seen.push((table.signature(), table.origin));
    })
    .unwrap();

    assert_eq!(
        seen,
        [
            (Signature(*b"APIC"), TableOrigin::Root),
            (Signature::FADT, TableOrigin::Root),
            (Signature::DSDT, TableOrigin::Fadt),
            (Signature::FACS, TableOrigin::Fadt),
            (Signature(*b"SSDT"), TableOrigin::Root),
        ]
    );
}

#[test]
fn revision_2_fadt_keeps_its_children_reachable() {
    let (allocator, log) = HeapPages::new();
    let mut store = AcpiTableStore::new(allocator, StoreConfig::default()).unwrap();
    let mut registry = MemRegistry::default();

    let dsdt = store.add(&sdt(b"DSDT", 2, 64), true).unwrap();
    let fadt_handle = store.add(&fadt(2, 244, 0, 0, 0, 0), true).unwrap();
    let facs_handle = store.add(&facs(), false).unwrap();
    store.publish(&mut registry).unwrap();

    let map = log.borrow().map_entries();
    let rc = RangeCheck::open(&mut VecSource(map), true, true).unwrap();
    let reader = unsafe { PhysReader::new(&IdentityMap, &rc) };

    let mut seen = Vec::new();
    visit(&reader, store.rsdp_address(), |table| {
        let bytes = table.bytes(&reader).unwrap();
        if table.signature() != Signature::FACS {
            assert_eq!(sum(bytes), 0, "{} checksum", table.signature());
        }
        seen.push(table.signature());
    })
    .unwrap();
    assert_eq!(seen, [Signature::FADT, Signature::DSDT, Signature::FACS]);

    // The revision only moves when a child lies above 4 GiB.
    let revision = store.copy_table(fadt_handle).unwrap()[8];
    let low = [dsdt, facs_handle]
        .into_iter()
        .all(|h| u32::try_from(store.table_address(h).unwrap()).is_ok());
    assert_eq!(revision, if low { 2 } else { 3 });
}
