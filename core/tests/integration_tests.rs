use std::sync::Arc;

use nwb_schema_core::{
    AttributeSpec, DatasetSpec, Dimension, FieldValue, GroupSpec, LinkSpec, Quantity, Spec,
    SpecCatalog, SpecError, SpecField, SpecFields, SpecKind, to_json, to_yaml,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn attribute(name: &str, doc: &str) -> Arc<AttributeSpec> {
    AttributeSpec::builder(name, "str", doc).build().unwrap()
}

fn ephys_tree() -> Arc<GroupSpec> {
    let dataset1 = DatasetSpec::builder("my first dataset", "int")
        .with_name("dataset1")
        .with_attributes([
            attribute("attribute3", "my third attribute"),
            attribute("attribute4", "my fourth attribute"),
        ])
        .with_linkable(true)
        .build()
        .unwrap();
    let dataset2 = DatasetSpec::builder("my second dataset", "int")
        .with_name("dataset2")
        .with_dimension(Dimension::unconstrained(2))
        .with_quantity(Quantity::Exactly(2))
        .with_attributes([attribute("attribute5", "my fifth attribute")])
        .with_linkable(true)
        .with_neurodata_type_def("EphysData")
        .build()
        .unwrap();
    let subgroup = GroupSpec::builder("A test subgroup")
        .with_name("subgroup1")
        .with_quantity(Quantity::ZeroOrOne)
        .with_linkable(false)
        .build()
        .unwrap();

    GroupSpec::builder("A test group")
        .with_name("root")
        .with_neurodata_type("Container")
        .with_neurodata_type_def("EphysGroup")
        .with_attributes([
            attribute("attribute1", "my first attribute"),
            attribute("attribute2", "my second attribute"),
        ])
        .with_datasets([dataset1, dataset2])
        .with_group(subgroup)
        .with_link(
            LinkSpec::builder("a link", "EphysData")
                .with_name("source")
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

fn names(group: &GroupSpec) -> Vec<String> {
    group
        .datasets()
        .iter()
        .filter_map(|d| d.name().map(String::from))
        .collect()
}

fn assert_parentage(group: &Arc<GroupSpec>) {
    for attribute in group.attributes() {
        assert!(attribute.parent().unwrap().is_group(group));
    }
    for dataset in group.datasets() {
        assert!(dataset.parent().unwrap().is_group(group));
        for attribute in dataset.attributes() {
            assert!(attribute.parent().unwrap().is_dataset(&dataset));
        }
    }
    for link in group.links() {
        assert!(link.parent().unwrap().is_group(group));
    }
    for child in group.groups() {
        assert!(child.parent().unwrap().is_group(group));
        assert_parentage(&child);
    }
}

// ---------------------------------------------------------------------------
// Serialized form
// ---------------------------------------------------------------------------

#[test]
fn test_dataset_json_has_only_supplied_fields_in_order() {
    let dataset = DatasetSpec::builder("my second dataset", "int")
        .with_name("dataset2")
        .with_dimension(Dimension::unconstrained(2))
        .with_linkable(true)
        .with_neurodata_type_def("EphysData")
        .with_attribute(attribute("attribute5", "my fifth attribute"))
        .build()
        .unwrap();

    assert_eq!(
        to_json(&*dataset).unwrap(),
        concat!(
            r#"{"doc":"my second dataset","name":"dataset2","neurodata_type_def":"EphysData","#,
            r#""dtype":"int","dimension":[null,null],"linkable":true,"#,
            r#""attributes":[{"doc":"my fifth attribute","name":"attribute5","dtype":"str"}]}"#
        )
    );
}

#[test]
fn test_linkable_omitted_is_absent_not_false() {
    let group = GroupSpec::builder("g").build().unwrap();
    let json = serde_json::to_value(&*group).unwrap();

    assert!(json.get("linkable").is_none());
    assert!(json.get("neurodata_type_def").is_none());
    assert!(json.get("name").is_none());
    assert_eq!(json["groups"], serde_json::json!([]));
    assert_eq!(
        group.keys(),
        vec![
            SpecField::Doc,
            SpecField::Attributes,
            SpecField::Datasets,
            SpecField::Groups,
            SpecField::Links
        ]
    );
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn test_yaml_round_trip_preserves_tree() {
    let original = ephys_tree();
    let yaml = to_yaml(&*original).unwrap();

    let rebuilt = GroupSpec::from_yaml(&yaml).unwrap();

    assert_eq!(*rebuilt, *original);
    assert_eq!(names(&rebuilt), vec!["dataset1", "dataset2"]);
    assert!(!rebuilt.datasets()[0].contains("neurodata_type_def"));
    assert_eq!(rebuilt.datasets()[1].quantity(), Some(Quantity::Exactly(2)));
    assert_eq!(rebuilt.get_group("subgroup1").unwrap().quantity(), Some(Quantity::ZeroOrOne));
    assert_parentage(&rebuilt);
}

#[test]
fn test_json_round_trip_through_generic_spec() {
    let original = ephys_tree();
    let json = to_json(&*original).unwrap();

    let rebuilt = Spec::from_json(&json).unwrap();

    assert_eq!(rebuilt, Spec::Group(original.clone()));
    assert!(!rebuilt.ptr_eq(&Spec::Group(original)));
    assert_eq!(to_json(&rebuilt).unwrap(), json);
}

#[test]
fn test_unknown_field_in_nested_child_is_named() {
    let json = r#"{
        "doc": "root",
        "datasets": [{"doc": "d", "dtype": "int", "linkabel": true}]
    }"#;

    let err = GroupSpec::from_json(json).unwrap_err();
    match err {
        SpecError::UnknownField { kind, field } => {
            assert_eq!(kind, SpecKind::Dataset);
            assert_eq!(field, "linkabel");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_dimension_is_rejected() {
    let err = DatasetSpec::from_yaml("doc: d\ndtype: int\ndimension: [3, 0]\n").unwrap_err();
    assert!(matches!(err, SpecError::InvalidField { field: "dimension", .. }));
    assert!(err.to_string().contains("axis 1"));
}

// ---------------------------------------------------------------------------
// Parentage
// ---------------------------------------------------------------------------

#[test]
fn test_field_value_children_are_the_attached_nodes() {
    let tree = ephys_tree();
    let Some(FieldValue::Datasets(datasets)) = tree.get(SpecField::Datasets) else {
        panic!("datasets field missing");
    };

    assert_eq!(datasets.len(), 2);
    assert!(Arc::ptr_eq(&datasets[0], &tree.get_dataset("dataset1").unwrap()));
    assert_eq!(
        datasets[1].get_attribute("attribute5").unwrap().path(),
        "root/dataset2/attribute5"
    );
}

#[test]
fn test_moving_dataset_between_groups() {
    let tree = ephys_tree();
    let other = GroupSpec::builder("other").with_name("other").build().unwrap();
    let dataset = tree.get_dataset("dataset1").unwrap();

    other.set_dataset(dataset.clone());

    assert_eq!(names(&tree), vec!["dataset2"]);
    assert_eq!(names(&other), vec!["dataset1"]);
    assert_eq!(dataset.path(), "other/dataset1");
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[test]
fn test_catalog_hierarchy_across_groups_and_datasets() {
    let tree = ephys_tree();
    let container = GroupSpec::builder("base container")
        .with_neurodata_type_def("Container")
        .build()
        .unwrap();

    let mut catalog = SpecCatalog::new();
    catalog.register_type(container).unwrap();
    catalog.register_type(tree.clone()).unwrap();
    catalog
        .register_type(tree.get_dataset("dataset2").unwrap())
        .unwrap();

    assert_eq!(
        catalog.get_hierarchy("EphysGroup").unwrap(),
        vec!["EphysGroup", "Container"]
    );
    assert_eq!(catalog.get_hierarchy("EphysData").unwrap(), vec!["EphysData"]);
    assert!(catalog.get_spec("EphysGroup").unwrap().ptr_eq(&Spec::Group(tree)));
}

#[test]
fn test_catalog_shared_read_only_across_threads() {
    let mut catalog = SpecCatalog::new();
    catalog.register_spec(
        "EphysData",
        DatasetSpec::builder("ephys", "int")
            .with_neurodata_type_def("EphysData")
            .build()
            .unwrap(),
    );
    catalog.register_spec(
        "SpikeData",
        DatasetSpec::builder("spikes", "int")
            .with_neurodata_type("EphysData")
            .with_neurodata_type_def("SpikeData")
            .build()
            .unwrap(),
    );

    let catalog = &catalog;
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(move || catalog.get_hierarchy("SpikeData").unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), vec!["SpikeData", "EphysData"]);
        }
    });
}

#[test]
fn test_spec_types_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Arc<GroupSpec>>();
    assert_send_sync::<Arc<DatasetSpec>>();
    assert_send_sync::<SpecCatalog>();
}
