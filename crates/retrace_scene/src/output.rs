use std::collections::BTreeMap;

use retrace_core::Value;

/// An image output: where pixels go, what data they carry, and any driver
/// or filter parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Output {
    /// File name, or a display name for interactive drivers.
    pub name: String,
    /// Driver type, e.g. `exr` or `driver_png`.
    pub type_name: String,
    /// `rgb`, `rgba`, `color <aov>`, `float <aov>` or `lpe <expression>`.
    pub data: String,
    pub parameters: BTreeMap<String, Value>,
}

impl Output {
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            data: data.into(),
            parameters: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}
