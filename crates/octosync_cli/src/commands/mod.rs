pub(crate) mod migrate;
pub(crate) mod run;
