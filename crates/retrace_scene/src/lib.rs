//! Scene-description data model and the edit interface implemented by
//! renderer backends.

pub mod camera;
pub mod interface;
pub mod object;
pub mod output;

pub use camera::Camera;
pub use interface::{
    AttributesHandle, AttributesInterface, ObjectHandle, ObjectInterface, SceneRenderer,
};
pub use object::{
    CurvesPrimitive, ExternalProcedural, MeshPrimitive, PointsPrimitive, PrimitiveVariables,
    Procedural, SceneObject, SpherePrimitive, VdbObject,
};
pub use output::Output;
