//! Per-file merge decisions
//!
//! Each filename is classified from its blob id in the current head (`c`),
//! the given tip (`g`) and the split point (`s`); `None` means the file is
//! absent on that side.
//!
//! | Condition              | Resolution    | Cases                                  |
//! |------------------------|---------------|----------------------------------------|
//! | `c == g`               | `Unchanged`   | same change on both sides, both removed |
//! | `s == c`, `g` present  | `TakeGiven`   | changed or created only in given        |
//! | `s == c`, `g` absent   | `Remove`      | removed in given, untouched in current  |
//! | `s == g`               | `KeepCurrent` | changed, created or removed only in current |
//! | otherwise              | `Conflict`    | diverged, or changed on one side and removed on the other |

use crate::artifacts::objects::object_id::ObjectId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Both sides agree; nothing to do
    Unchanged,
    /// Only the current side changed; keep it as is
    KeepCurrent,
    /// Only the given side changed; take its version
    TakeGiven(ObjectId),
    /// Only the given side removed the file; remove it
    Remove,
    /// Both sides changed the file differently
    Conflict {
        current: Option<ObjectId>,
        given: Option<ObjectId>,
    },
}

impl Resolution {
    pub fn classify(
        current: Option<&ObjectId>,
        given: Option<&ObjectId>,
        split: Option<&ObjectId>,
    ) -> Self {
        if current == given {
            return Resolution::Unchanged;
        }

        if split == current {
            return match given {
                Some(given) => Resolution::TakeGiven(given.clone()),
                None => Resolution::Remove,
            };
        }

        if split == given {
            return Resolution::KeepCurrent;
        }

        Resolution::Conflict {
            current: current.cloned(),
            given: given.cloned(),
        }
    }
}
