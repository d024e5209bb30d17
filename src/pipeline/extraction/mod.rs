pub mod types;
pub mod normalize;
pub mod ocr_correction;
pub mod gazetteer;
pub mod fields;

pub use types::*;
pub use normalize::{clean_lines, normalize};
pub use ocr_correction::correct_ocr_errors;
pub use gazetteer::{enhance_with_locality, find_area_code, is_known_area_code, Locality};
pub use fields::{extract_fields, extract_postcode, extract_street};
