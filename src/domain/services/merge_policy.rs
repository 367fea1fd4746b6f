use crate::domain::entities::Tag;
use crate::domain::value_objects::TaggingResult;

/// Decide whether a newly computed result supersedes the current tag.
///
/// Asymmetric anti-thrashing rule: a complete, non-default tag is only
/// displaced by a strictly more confident result. The safety-net default
/// loses to any successful result regardless of confidence ordering.
pub fn should_update(current: &Tag, new_result: &TaggingResult) -> bool {
    new_result.is_successful()
        && (!current.is_complete()
            || new_result.confidence() > current.confidence
            || current.is_default_tag())
}
