pub(crate) mod spiral;
