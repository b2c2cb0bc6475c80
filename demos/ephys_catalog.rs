//! Ephys catalog example.
//!
//! Builds a small electrophysiology spec tree, registers its types in a
//! catalog, resolves their hierarchies and prints the tree as YAML.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p nwb-schema-demos --example ephys_catalog
//!
//! # With attach/registration events
//! RUST_LOG=debug cargo run -p nwb-schema-demos --example ephys_catalog
//! ```

use nwb_schema_core::{
    AttributeSpec, DatasetSpec, Dimension, GroupSpec, LinkSpec, Quantity, SpecCatalog, to_yaml,
};
use tracing_subscriber::EnvFilter;

fn main() -> nwb_schema_core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ephys = DatasetSpec::builder("voltage samples", "int16")
        .with_dimension(Dimension::unconstrained(2))
        .with_linkable(false)
        .with_neurodata_type_def("EphysData")
        .with_attribute(AttributeSpec::builder("unit", "text", "sample unit").build()?)
        .build()?;

    let spikes = DatasetSpec::builder("detected spike times", "float64")
        .with_neurodata_type("EphysData")
        .with_neurodata_type_def("SpikeData")
        .with_quantity(Quantity::ZeroOrMany)
        .build()?;

    let lfp = DatasetSpec::builder("low-pass filtered voltage", "float32")
        .with_neurodata_type("EphysData")
        .with_neurodata_type_def("LFPData")
        .build()?;

    let module = GroupSpec::builder("an ephys processing module")
        .with_neurodata_type_def("EphysModule")
        .with_attribute(
            AttributeSpec::builder("description", "text", "what was done")
                .with_required(false)
                .build()?,
        )
        .with_datasets([spikes.clone(), lfp.clone()])
        .with_link(
            LinkSpec::builder("source recording", "EphysData")
                .with_name("source")
                .build()?,
        )
        .build()?;

    let mut catalog = SpecCatalog::new();
    catalog.register_type(ephys)?;
    catalog.register_type(spikes.clone())?;
    catalog.register_type(lfp)?;
    catalog.register_type(module.clone())?;

    println!("=== Registered types ===");
    for name in catalog.registered_types() {
        println!("  {}", catalog.get_hierarchy(name)?.join(" -> "));
    }

    println!();
    println!("=== Paths ===");
    println!("  {}", spikes.path());
    if let Some(link) = module.get_link("source") {
        println!("  {}", link.path());
    }

    println!();
    println!("=== EphysModule as YAML ===");
    print!("{}", to_yaml(&*module)?);

    Ok(())
}
