pub(crate) mod encode;
pub(crate) mod scene;
pub(crate) mod text;
