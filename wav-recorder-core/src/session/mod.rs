pub mod capture;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod test_support;
