pub mod fixtures;

pub mod integration {
    pub mod stamp_verify;
}

pub mod unit {
    pub mod reconciler_tests;
}
