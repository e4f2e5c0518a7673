// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! CRD YAML Generator
//!
//! Generates Kubernetes CRD YAML files from Rust types defined in src/crd.rs.
//! This ensures the YAML files in deploy/crds/ are always in sync with the Rust code.
//!
//! Usage:
//!   cargo run --bin crdgen
//!
//! Generated files will be written to deploy/crds/ with proper headers.

use cdoperator::crd::{
    ClusterDeployment, ClusterDeploymentCustomization, ClusterDeprovision, ClusterImageSet,
    ClusterProvision, ClusterSync, DNSZone,
};
use kube::CustomResourceExt;
use std::fs;
use std::path::Path;

const COPYRIGHT_HEADER: &str = "# Copyright (c) 2025 Erick Bourgeois, firestoned
# SPDX-License-Identifier: MIT
#
# This file is AUTO-GENERATED from src/crd.rs
# DO NOT EDIT MANUALLY - Run `cargo run --bin crdgen` to regenerate
#
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = Path::new("deploy/crds");

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    println!("Generating CRD YAML files from src/crd.rs...");

    generate_crd::<ClusterDeployment>("clusterdeployments.crd.yaml", output_dir)?;
    generate_crd::<ClusterProvision>("clusterprovisions.crd.yaml", output_dir)?;
    generate_crd::<ClusterDeprovision>("clusterdeprovisions.crd.yaml", output_dir)?;
    generate_crd::<ClusterImageSet>("clusterimagesets.crd.yaml", output_dir)?;
    generate_crd::<DNSZone>("dnszones.crd.yaml", output_dir)?;
    generate_crd::<ClusterSync>("clustersyncs.crd.yaml", output_dir)?;
    generate_crd::<ClusterDeploymentCustomization>(
        "clusterdeploymentcustomizations.crd.yaml",
        output_dir,
    )?;

    println!("✓ Successfully generated CRD YAML files in deploy/crds/");
    println!("\nNext steps:");
    println!("  1. Review the generated files");
    println!("  2. Deploy with: kubectl apply -f deploy/crds/");

    Ok(())
}

fn generate_crd<T>(filename: &str, output_dir: &Path) -> Result<(), Box<dyn std::error::Error>>
where
    T: CustomResourceExt,
{
    let crd = T::crd();
    let yaml = serde_yaml::to_string(&crd)?;
    let content = format!("{COPYRIGHT_HEADER}{yaml}");

    let output_path = output_dir.join(filename);
    fs::write(&output_path, content)?;

    println!("  ✓ Generated {filename}");

    Ok(())
}
