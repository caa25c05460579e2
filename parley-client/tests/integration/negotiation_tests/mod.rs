pub mod test_failures_are_contained;
pub mod test_glare_resolution;
