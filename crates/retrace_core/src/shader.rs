//! Shader Networks
//!
//! A [`ShaderNetwork`] is a small graph of shaders joined by parameter
//! connections, with one shader designated as the output. Networks are
//! compiled into native nodes by an external shader converter; retrace only
//! needs to hash them and hand them over.

use std::collections::BTreeMap;

use crate::hash::{ContentHasher, HashContent};
use crate::value::Value;

/// One shader in a network.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shader {
    /// Native shader type, e.g. `standard_surface` or `point_light`.
    pub name: String,
    /// Usage category, e.g. `ai:surface` or `ai:light`.
    pub shader_type: String,
    pub parameters: BTreeMap<String, Value>,
}

impl Shader {
    #[must_use]
    pub fn new(name: impl Into<String>, shader_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shader_type: shader_type.into(),
            parameters: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// A (shader handle, parameter or output name) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Plug {
    pub shader: String,
    pub name: String,
}

impl Plug {
    #[must_use]
    pub fn new(shader: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            shader: shader.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Connection {
    pub source: Plug,
    pub destination: Plug,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderNetwork {
    shaders: BTreeMap<String, Shader>,
    connections: Vec<Connection>,
    output: Option<String>,
}

impl ShaderNetwork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a single-shader network whose output is that shader.
    #[must_use]
    pub fn single(handle: impl Into<String>, shader: Shader) -> Self {
        let handle = handle.into();
        let mut network = Self::new();
        network.add_shader(handle.clone(), shader);
        network.set_output(handle);
        network
    }

    pub fn add_shader(&mut self, handle: impl Into<String>, shader: Shader) {
        self.shaders.insert(handle.into(), shader);
    }

    pub fn add_connection(&mut self, source: Plug, destination: Plug) {
        self.connections.push(Connection {
            source,
            destination,
        });
    }

    pub fn set_output(&mut self, handle: impl Into<String>) {
        self.output = Some(handle.into());
    }

    #[must_use]
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    #[must_use]
    pub fn output_shader(&self) -> Option<&Shader> {
        self.output.as_ref().and_then(|h| self.shaders.get(h))
    }

    #[must_use]
    pub fn shader(&self, handle: &str) -> Option<&Shader> {
        self.shaders.get(handle)
    }

    /// Shaders in handle order.
    pub fn shaders(&self) -> impl Iterator<Item = (&str, &Shader)> {
        self.shaders.iter().map(|(h, s)| (h.as_str(), s))
    }

    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Connections feeding parameters of `handle`.
    pub fn input_connections<'a>(&'a self, handle: &'a str) -> impl Iterator<Item = &'a Connection> {
        self.connections
            .iter()
            .filter(move |c| c.destination.shader == handle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}

impl HashContent for Shader {
    fn hash_content(&self, h: &mut ContentHasher) {
        h.write_str(&self.name);
        h.write_str(&self.shader_type);
        h.write_u64(self.parameters.len() as u64);
        for (name, value) in &self.parameters {
            h.write_str(name);
            value.hash_content(h);
        }
    }
}

impl HashContent for ShaderNetwork {
    fn hash_content(&self, h: &mut ContentHasher) {
        h.write_u64(self.shaders.len() as u64);
        for (handle, shader) in &self.shaders {
            h.write_str(handle);
            shader.hash_content(h);
        }
        let mut connections: Vec<&Connection> = self.connections.iter().collect();
        connections.sort();
        h.write_u64(connections.len() as u64);
        for c in connections {
            h.write_str(&c.source.shader);
            h.write_str(&c.source.name);
            h.write_str(&c.destination.shader);
            h.write_str(&c.destination.name);
        }
        h.write_str(self.output.as_deref().unwrap_or(""));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::ContentHash;

    fn network(order: &[(&str, &str)]) -> ShaderNetwork {
        let mut n = ShaderNetwork::new();
        n.add_shader("tex", Shader::new("image", "ai:shader"));
        n.add_shader("surf", Shader::new("standard_surface", "ai:surface"));
        n.add_shader("noise", Shader::new("noise", "ai:shader"));
        for (src, dst) in order {
            n.add_connection(Plug::new(*src, "out"), Plug::new("surf", *dst));
        }
        n.set_output("surf");
        n
    }

    #[test]
    fn connection_order_does_not_affect_hash() {
        let a = network(&[("tex", "base_color"), ("noise", "roughness")]);
        let b = network(&[("noise", "roughness"), ("tex", "base_color")]);
        assert_eq!(ContentHash::of(&a), ContentHash::of(&b));
    }

    #[test]
    fn parameters_affect_hash() {
        let a = ShaderNetwork::single("s", Shader::new("flat", "ai:surface"));
        let b = ShaderNetwork::single(
            "s",
            Shader::new("flat", "ai:surface").with_parameter("color", 0.5_f32),
        );
        assert_ne!(ContentHash::of(&a), ContentHash::of(&b));
        assert_eq!(b.output_shader().map(|s| s.name.as_str()), Some("flat"));
    }
}
