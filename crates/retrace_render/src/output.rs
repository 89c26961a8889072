//! Outputs
//!
//! Each output becomes a driver node and a pixel filter node, plus one entry
//! in the options `outputs` array:
//!
//! ```text
//!   "<data> <filter node> <driver node>"     e.g.  "RGBA RGBA filter:beauty display:beauty"
//! ```
//!
//! Light path expression outputs also add `"lpe:<name> <expression>"` to
//! `light_path_expressions`.

use log::warn;
use retrace_core::{Result, RetraceError, Value};
use retrace_native::{NodeHandle, NodeKind, ParamValue, Universe};
use retrace_scene::Output;

use crate::session::NodeContext;

const DEFAULT_FILTER: &str = "gaussian";

fn is_kind(universe: &Universe, type_name: &str, kind: NodeKind) -> bool {
    universe.entry(type_name).is_some_and(|e| e.kind() == kind)
}

/// Formats a `header:<name>` parameter as a driver custom attribute.
fn format_header(name: &str, value: &Value) -> Option<String> {
    let formatted = match value {
        Value::Bool(v) => format!("int '{name}' {}", i32::from(*v)),
        Value::Int(v) => format!("int '{name}' {v}"),
        Value::Float(v) => format!("float '{name}' {v:.6}"),
        Value::String(_)
        | Value::V2i(_)
        | Value::V2f(_)
        | Value::V3f(_)
        | Value::Color3(_)
        | Value::Color4(_) => format!("string '{name}' {value}"),
        _ => {
            warn!(
                "Cannot convert header \"{name}\" of type \"{}\"",
                value.type_name()
            );
            return None;
        }
    };
    Some(formatted)
}

pub struct OutputNodes {
    driver: NodeHandle,
    filter: NodeHandle,
    driver_name: String,
    filter_name: String,
    data: String,
    lpe: Option<String>,
    camera_override: Option<String>,
}

impl OutputNodes {
    pub(crate) fn new(context: &NodeContext, name: &str, output: &Output) -> Result<Self> {
        let universe = &context.universe;

        // ─── Driver ──────────────────────────────────────────────────────────

        let mut driver_type = output.type_name.clone();
        if !is_kind(universe, &driver_type, NodeKind::Driver) {
            let prefixed = format!("driver_{driver_type}");
            if universe.entry(&prefixed).is_some() {
                driver_type = prefixed;
            }
        }
        let driver_name = format!("display:{name}");
        let driver = universe
            .create_node(&driver_type, &driver_name, context.parent)
            .map(|id| context.handle(id))
            .ok_or_else(|| RetraceError::OutputDriver(driver_type.clone()))?;
        let driver_id = driver.id();

        if universe.has_parameter(driver_id, "filename") {
            universe.set(driver_id, "filename", output.name.as_str());
        }

        let mut custom_attributes: Vec<String> = output
            .parameters
            .get("custom_attributes")
            .and_then(Value::as_string_vec)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        let mut camera_override = None;

        for (parameter, value) in &output.parameters {
            if parameter.starts_with("filter") || parameter == "custom_attributes" {
                continue;
            }
            if let Some(header) = parameter.strip_prefix("header:") {
                custom_attributes.extend(format_header(header, value));
                continue;
            }
            if parameter == "camera"
                && let Some(camera) = value.as_str()
            {
                camera_override = (!camera.is_empty()).then(|| camera.to_string());
                continue;
            }
            universe.set(driver_id, parameter, ParamValue::from(value));
        }

        if universe.has_parameter(driver_id, "custom_attributes") {
            universe.set(
                driver_id,
                "custom_attributes",
                ParamValue::strings(&custom_attributes),
            );
        }

        // ─── Filter ──────────────────────────────────────────────────────────

        let mut filter_type = output
            .parameters
            .get("filter")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_FILTER)
            .to_string();
        if !is_kind(universe, &filter_type, NodeKind::Filter) {
            filter_type.push_str("_filter");
        }
        if !is_kind(universe, &filter_type, NodeKind::Filter) {
            return Err(RetraceError::OutputFilter(filter_type));
        }
        let filter_name = format!("filter:{name}");
        let filter = universe
            .create_node(&filter_type, &filter_name, context.parent)
            .map(|id| context.handle(id))
            .ok_or_else(|| RetraceError::OutputFilter(filter_type.clone()))?;

        for (parameter, value) in &output.parameters {
            let Some(filter_parameter) = parameter.strip_prefix("filter") else {
                continue;
            };
            if filter_parameter.is_empty() {
                continue;
            }
            if filter_parameter == "width"
                && let Some(width) = value.as_v2f()
            {
                if width.x != width.y {
                    warn!("Non-square filterwidth not supported");
                }
                universe.set(filter.id(), "width", width.x);
                continue;
            }
            universe.set(filter.id(), filter_parameter, ParamValue::from(value));
        }

        // ─── Data ────────────────────────────────────────────────────────────

        let include_alpha = output
            .parameters
            .get("includeAlpha")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let channels = if include_alpha { "RGBA" } else { "RGB" };

        let mut lpe = None;
        let data = match output.data.as_str() {
            "rgb" => "RGB RGB".to_string(),
            "rgba" => "RGBA RGBA".to_string(),
            other => {
                let tokens: Vec<&str> = other.split(' ').filter(|t| !t.is_empty()).collect();
                match tokens.as_slice() {
                    ["color", aov] => format!("{aov} {channels}"),
                    ["lpe", expression] => {
                        let lpe_name = format!("lpe:{name}");
                        lpe = Some(format!("{lpe_name} {expression}"));
                        format!("{lpe_name} {channels}")
                    }
                    _ => other.to_string(),
                }
            }
        };

        Ok(Self {
            driver,
            filter,
            driver_name,
            filter_name,
            data,
            lpe,
            camera_override,
        })
    }

    /// Adds this output's entries to the options arrays.
    pub fn append(&self, outputs: &mut Vec<String>, light_path_expressions: &mut Vec<String>) {
        outputs.push(format!("{} {} {}", self.data, self.filter_name, self.driver_name));
        if let Some(lpe) = &self.lpe {
            light_path_expressions.push(lpe.clone());
        }
    }

    /// The camera this output renders from, if not the session camera.
    #[must_use]
    pub fn camera_override(&self) -> Option<&str> {
        self.camera_override.as_deref()
    }

    #[must_use]
    pub fn driver(&self) -> &NodeHandle {
        &self.driver
    }

    #[must_use]
    pub fn filter(&self) -> &NodeHandle {
        &self.filter
    }

    /// The converted output data, e.g. `RGBA RGBA`.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }
}
