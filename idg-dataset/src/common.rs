pub use caption_text::{Vocabulary, UNK, UNK_ID};
pub use indexmap::{IndexMap, IndexSet};
pub use itertools::Itertools as _;
pub use log::{debug, info, warn};
pub use ndarray::{Array1, Array3, ArrayD, ArrayView3, ArrayViewD, Axis, Ix3, IxDyn};
pub use noisy_float::prelude::*;
pub use serde::{de::DeserializeOwned, Deserialize, Serialize};
pub use std::{
    fmt::{self, Debug},
    fs::{self, File},
    io::{BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
    str::FromStr,
};
