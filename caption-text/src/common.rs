pub use indexmap::{IndexMap, IndexSet};
pub use itertools::Itertools as _;
pub use log::{debug, info, warn};
pub use once_cell::sync::Lazy;
pub use serde::{Deserialize, Serialize};
pub use std::{
    collections::{hash_map, HashMap},
    fmt::{self, Debug},
    str::FromStr,
};
