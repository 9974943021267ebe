pub(crate) mod archive;
pub(crate) mod compositor;
pub(crate) mod source;
