/*! This library emulates the WebGPU object model in software.
 *  It lets code written against WebGPU run where no GPU backend exists,
 *  and exposes what *would* have been submitted to a device for inspection.
 */

#![allow(
    // Registries and trackers are always built through `new`.
    clippy::new_without_default,
    // Copy and write entry points mirror the WebGPU argument lists.
    clippy::too_many_arguments,
)]
#![warn(
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_qualifications
)]

pub mod binding_model;
pub mod command;
pub mod device;
pub mod error;
pub mod global;
pub mod hub;
pub mod id;
pub mod identity;
pub mod instance;
pub mod memory;
pub mod pipeline;
pub mod present;
pub mod registry;
pub mod resource;
pub mod storage;
mod track;

pub use wgt;

use std::borrow::Cow;

type Index = u32;
type Epoch = u32;

pub type Label<'a> = Option<Cow<'a, str>>;

trait LabelHelpers<'a> {
    fn borrow_option(&'a self) -> Option<&'a str>;
    fn to_owned_or_default(&'a self) -> String;
}
impl<'a> LabelHelpers<'a> for Label<'a> {
    fn borrow_option(&'a self) -> Option<&'a str> {
        self.as_ref().map(|cow| cow.as_ref())
    }
    fn to_owned_or_default(&'a self) -> String {
        self.borrow_option().unwrap_or_default().to_string()
    }
}

/// Fast hash map used internally.
type FastHashMap<K, V> =
    std::collections::HashMap<K, V, std::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

macro_rules! api_log {
    ($($arg:tt)+) => (log::trace!($($arg)+))
}
pub(crate) use api_log;

macro_rules! resource_log {
    ($($arg:tt)+) => (log::trace!($($arg)+))
}
pub(crate) use resource_log;
