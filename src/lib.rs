//! Verifies an object detector against golden expectations.
//!
//! A source frame is warped into the square model input through an affine frame-to-crop
//! transform, the detector runs on the crop, its detections are mapped back into the frame with
//! the inverse transform and every expected detection must find a candidate with the same label,
//! a box overlapping more than 95% of both areas and a confidence within 0.01.

pub mod annotations;
pub mod config;
pub mod image_transformation;
pub mod image_utils;
pub mod object_detection;
pub mod verification;
