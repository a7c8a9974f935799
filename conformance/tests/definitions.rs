//! Activates the shipped definition sources and checks the result.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use liha_conformance::run_all;
use liha_model::{ids, AttributeId, BrowseDirection, NamespaceTable, NodeId, ReferenceEdge, Variant};
use liha_nodemanager::{
    ApplicationConfiguration, ExternalReferences, LiHaConfiguration, LiHaSystemNodeManager,
    ReferenceFilter, ServerContext,
};

fn activate() -> (LiHaSystemNodeManager, ExternalReferences) {
    let mut configuration = ApplicationConfiguration::default();
    let liha = LiHaConfiguration {
        definition_root: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../definitions"),
        ..LiHaConfiguration::default()
    };
    configuration
        .set_extension(LiHaConfiguration::EXTENSION_NAME, &liha)
        .unwrap();

    let server = ServerContext::new(NamespaceTable::shared());
    let manager = LiHaSystemNodeManager::new(&server, &configuration).unwrap();
    let mut outbox = ExternalReferences::new();
    let summary = manager.create_address_space(&mut outbox).unwrap();
    assert_eq!(summary.sources, 4);
    assert_eq!(summary.nodes, 32);
    assert_eq!(summary.allocated, 4);
    (manager, outbox)
}

#[test]
fn shipped_definitions_conform() {
    let (manager, outbox) = activate();
    let report = run_all(&manager, &outbox).unwrap();
    assert!(report.all_passed(), "{report}");
}

#[test]
fn shipped_definitions_register_every_model() {
    let (manager, _) = activate();
    let loaded = manager.loaded_models();
    for uri in [
        "http://opcfoundation.org/UA/DI/",
        "http://opcfoundation.org/UA/Machinery/",
        "http://opcfoundation.org/UA/LADS/",
        "http://liha.org/UA/LiHaSystem",
    ] {
        assert!(loaded.contains(uri), "{uri} not loaded");
    }
}

#[test]
fn liha_instance_is_reachable_from_the_objects_folder() {
    let (manager, outbox) = activate();
    let liha = NodeId::numeric(manager.namespace_index(), 5001);

    assert!(outbox.contains(
        &ids::OBJECTS_FOLDER,
        &ReferenceEdge::forward(ids::ORGANIZES, liha.clone())
    ));

    let children = manager
        .browse(
            &liha,
            BrowseDirection::Forward,
            &ReferenceFilter::with_subtypes(ids::HIERARCHICAL_REFERENCES),
        )
        .unwrap();
    let names: Vec<String> = children
        .iter()
        .filter_map(|c| c.browse_name.as_ref().map(|n| n.name.clone()))
        .collect();
    for expected in ["ChannelCount", "SerialNumber", "Manufacturer", "FunctionalUnitSet", "Initialize"] {
        assert!(names.iter().any(|n| n == expected), "missing {expected} in {names:?}");
    }

    let channels = children
        .iter()
        .find(|c| c.browse_name.as_ref().is_some_and(|n| n.name == "ChannelCount"))
        .unwrap();
    assert_eq!(channels.node_id.namespace_index, manager.instance_namespace_index());
    assert_eq!(
        manager.read(&channels.node_id, AttributeId::Value).unwrap(),
        Variant::UInt16(8)
    );
    manager
        .write(&channels.node_id, AttributeId::Value, Variant::UInt16(4))
        .unwrap();
    assert_eq!(
        manager.read(&channels.node_id, AttributeId::Value).unwrap(),
        Variant::UInt16(4)
    );
}
