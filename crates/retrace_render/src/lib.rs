//! Render adapter: content-addressed shader and instance caches, attribute
//! bundles, light-filter linking, object façades and the renderer itself.
//!
//! ```text
//!  host ──► Renderer (SceneRenderer)
//!             ├── attributes() ──► AttributeBundle ──► ShaderCache
//!             ├── object()     ──► InstanceCache ──► ObjectConverter
//!             ├── light()      ──► RenderLight ─────┐
//!             ├── light_filter()─► RenderLightFilter ┴──► LinkGraph
//!             └── render()     ──► sweep, link, RenderEngine
//! ```

pub mod attributes;
pub mod cache;
pub mod convert;
mod globals;
pub mod instance;
pub mod light;
pub mod light_filter;
pub mod light_list;
pub mod links;
pub mod motion;
pub mod object;
pub mod output;
pub mod procedural;
pub mod progressive;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod shader;

pub use attributes::{AttributeBundle, RayTypes, ShadingFlags};
pub use cache::ContentCache;
pub use convert::{ObjectConverter, ShaderConverter};
pub use instance::{Instance, InstanceCache};
pub use light::RenderLight;
pub use light_filter::RenderLightFilter;
pub use light_list::LightListCache;
pub use links::{LinkGraph, LinkReport};
pub use motion::ensure_uniform_time_samples;
pub use object::RenderObject;
pub use output::OutputNodes;
pub use procedural::ProceduralRenderer;
pub use progressive::{ProgressiveRender, aa_sample_steps};
pub use renderer::Renderer;
pub use session::{Converters, Session};
pub use settings::{ProgressiveSettings, RendererSettings};
pub use shader::{CompiledShader, ShaderCache, ShaderNodes};
