//! Probability distributions needed by the ESD test.
//!
//! Every function here is pure: domain violations are reported by returning
//! `f64::NAN` rather than panicking, so callers must check the result before
//! comparing against it.
//!
//! - Normal: PDF, CDF (Winitzki erf), quantile (Wichura AS241)
//! - Student's t: PDF, CDF (Hill 395), quantile (Hill 396)

mod normal;
mod special;
mod students_t;

pub use normal::{erf, normal_cdf, normal_pdf, normal_ppf};
pub use special::ln_gamma;
pub use students_t::{students_t_cdf, students_t_pdf, students_t_ppf};
