#![allow(unused_macros)]
use rstest_reuse::template;

// A testing "template" to run a property against every rounding mode

#[template]
#[rstest]
#[case::none(sps_core::models::RoundingMode::None)]
#[case::whole(sps_core::models::RoundingMode::Whole)]
#[case::charm(sps_core::models::RoundingMode::Charm)]
pub fn all_rounding_modes(#[case] mode: sps_core::models::RoundingMode) -> () {}
