//! # NetCDF File Information Module
//!
//! Describes a climatology file: dimensions, variables, attributes, and which
//! figure variables can be drawn from it with the current render configuration.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

use crate::config::RenderConfig;
use crate::figname::Variable;
use crate::vocab::NcSource;

/// Information about a NetCDF dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetCdfDimensionInfo {
    pub name: String,
    pub length: usize,
    pub is_unlimited: bool,
}

/// Information about a NetCDF variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetCdfVariableInfo {
    pub name: String,
    pub data_type: String,
    pub dimensions: Vec<String>,
    pub attributes: HashMap<String, String>,
    pub shape: Vec<usize>,
}

/// Complete information about a NetCDF file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetCdfInfo {
    pub path: String,
    pub dimensions: Vec<NetCdfDimensionInfo>,
    pub variables: Vec<NetCdfVariableInfo>,
    pub global_attributes: HashMap<String, String>,
    pub file_size: Option<u64>,
    pub total_variables: usize,
    pub total_dimensions: usize,
    /// Figure variables whose NetCDF source is present in the file
    pub figure_variables: Vec<String>,
}

/// Extract comprehensive information from a NetCDF file
pub fn get_netcdf_info(
    file_path: &str,
    variable: Option<&str>,
    detailed: bool,
    config: &RenderConfig,
) -> Result<NetCdfInfo> {
    debug!("Opening NetCDF file: {}", file_path);
    let file = netcdf::open(file_path)
        .with_context(|| format!("Failed to open NetCDF file: {}", file_path))?;
    let file_size = fs::metadata(file_path).ok().map(|m| m.len());

    let dimensions: Vec<NetCdfDimensionInfo> = file
        .dimensions()
        .map(|dim| NetCdfDimensionInfo {
            name: dim.name().to_string(),
            length: dim.len(),
            is_unlimited: dim.is_unlimited(),
        })
        .collect();

    let mut variables = Vec::new();
    for var in file.variables() {
        if variable.is_some_and(|v| var.name() != v) {
            continue;
        }
        let mut attributes = HashMap::new();
        for attr in var.attributes() {
            if let Ok(value) = attr.value() {
                attributes.insert(attr.name().to_string(), format_attribute_value(&value));
            }
        }
        variables.push(NetCdfVariableInfo {
            name: var.name().to_string(),
            data_type: format!("{:?}", var.vartype()),
            dimensions: var.dimensions().iter().map(|d| d.name().to_string()).collect(),
            attributes,
            shape: var.dimensions().iter().map(|d| d.len()).collect(),
        });
    }

    let mut global_attributes = HashMap::new();
    if detailed {
        for attr in file.attributes() {
            if let Ok(value) = attr.value() {
                global_attributes.insert(attr.name().to_string(), format_attribute_value(&value));
            }
        }
    }

    let present: Vec<String> = file.variables().map(|v| v.name().to_string()).collect();
    let figure_variables = servable_variables(config, &present);

    file.close().context("Failed to close NetCDF file")?;

    Ok(NetCdfInfo {
        path: file_path.to_string(),
        total_dimensions: dimensions.len(),
        total_variables: variables.len(),
        dimensions,
        variables,
        global_attributes,
        file_size,
        figure_variables,
    })
}

/// Figure variables whose NetCDF variable(s) appear in `present`
pub fn servable_variables(config: &RenderConfig, present: &[String]) -> Vec<String> {
    let has = |name: &str| present.iter().any(|p| p == name);
    Variable::ALL
        .iter()
        .filter(|v| match config.source_for(**v) {
            Ok(NcSource::Scalar(name)) => has(&name),
            Ok(NcSource::Vector { u, v }) => has(&u) && has(&v),
            Err(_) => false,
        })
        .map(|v| v.as_str().to_string())
        .collect()
}

fn format_attribute_value(value: &netcdf::AttributeValue) -> String {
    match value {
        netcdf::AttributeValue::Str(s) => s.clone(),
        other => format!("{:?}", other),
    }
}

/// Print NetCDF info in human-readable format
pub fn print_file_info_human(info: &NetCdfInfo) {
    println!("NetCDF File Information:");
    println!("  Path: {}", info.path);
    if let Some(size) = info.file_size {
        println!("  File Size: {:.2} MB", size as f64 / 1_048_576.0);
    }
    println!("  Dimensions: {} total", info.total_dimensions);
    for dim in &info.dimensions {
        println!(
            "    {} ({}{})",
            dim.name,
            dim.length,
            if dim.is_unlimited { ", unlimited" } else { "" }
        );
    }
    println!("  Variables: {} total", info.total_variables);
    for var in &info.variables {
        println!(
            "    {} ({}) - dimensions: [{}]",
            var.name,
            var.data_type,
            var.dimensions.join(", ")
        );
        for (name, value) in &var.attributes {
            println!("      @{}: {}", name, value);
        }
    }
    if !info.global_attributes.is_empty() {
        println!("  Global Attributes:");
        for (name, value) in &info.global_attributes {
            println!("    @{}: {}", name, value);
        }
    }
    if info.figure_variables.is_empty() {
        println!("  Figure variables: none");
    } else {
        println!("  Figure variables: {}", info.figure_variables.join(", "));
    }
}

pub fn print_file_info_json(info: &NetCdfInfo) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(info)?);
    Ok(())
}

pub fn print_file_info_yaml(info: &NetCdfInfo) -> Result<()> {
    let yaml = serde_yaml::to_string(info).context("Failed to serialize NetCDF info to YAML")?;
    println!("{}", yaml);
    Ok(())
}

/// Print NetCDF info in CSV format (variables only)
pub fn print_file_info_csv(info: &NetCdfInfo) -> Result<()> {
    println!("variable_name,data_type,dimensions,shape,attributes_count");
    for var in &info.variables {
        let shape: Vec<String> = var.shape.iter().map(|s| s.to_string()).collect();
        println!(
            "{},{},\"{}\",\"{}\",{}",
            var.name,
            var.data_type,
            var.dimensions.join(";"),
            shape.join(";"),
            var.attributes.len()
        );
    }
    Ok(())
}
