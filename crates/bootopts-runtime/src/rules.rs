//! Cross-option rules of the runtime schema.

use bootopts_core::{
    AtMostOne, ConsistencyRule, FnRule, LengthMatches, NotAbove, RequiresAny, SumWithinTotal,
};

use crate::schema::{ALL_OUTPUTS, NATIVE_OUTPUTS};

/// Consistency rules over [`runtime_table`](crate::runtime_table), in the
/// order they are checked.
pub fn runtime_rules() -> Vec<Box<dyn ConsistencyRule>> {
    vec![
        Box::new(SumWithinTotal::new("nthreads_per_pool", "nthreads").against_defaults()),
        Box::new(LengthMatches::new("nthreads_per_pool", "nthreadpools").against_defaults()),
        Box::new(AtMostOne::new(NATIVE_OUTPUTS)),
        Box::new(NotAbove::new("heap_size_hint", "hard_heap_limit").zero_is_unlimited()),
        Box::new(NotAbove::new("heap_target_increment", "hard_heap_limit").zero_is_unlimited()),
        Box::new(NotAbove::new("opt_level_min", "opt_level")),
        Box::new(RequiresAny::new("incremental", ALL_OUTPUTS)),
        Box::new(RequiresAny::new("strip_ir", ALL_OUTPUTS)),
        Box::new(RequiresAny::new("strip_metadata", ALL_OUTPUTS)),
        Box::new(RequiresAny::new("trace_compile_timing", ["trace_compile"])),
        Box::new(trim_requires_output()),
    ]
}

fn trim_requires_output() -> FnRule {
    let options: Vec<&str> = std::iter::once("trim").chain(ALL_OUTPUTS).collect();
    FnRule::new("trim_requires_output", options, |config| {
        let trimming = config.get_str("trim").map_err(|e| e.to_string())? != "no";
        if !trimming {
            return Ok(());
        }
        for id in ALL_OUTPUTS {
            if config.get(id).map_err(|e| e.to_string())?.is_set() {
                return Ok(());
            }
        }
        Err("trim only applies when writing an output image".to_string())
    })
}
