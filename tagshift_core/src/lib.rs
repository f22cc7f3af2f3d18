//! `tagshift_core` converts email templates between two template dialects:
//! Handlebars style merge tags (`{{user.name}}`, `{{#each orders}}`) and
//! Laravel Blade directives (`{{ $user->name }}`, `@foreach($orders as $order)`).
//!
//! ## Processing Pipeline
//!
//! ```text
//! template text
//!   → comments   (converted, then sealed away from later passes)
//!   → loops      (nested blocks recurse, `this` bound through the loop stack)
//!   → conditionals
//!   → raw echoes
//!   → plain echoes
//!   → sealed comments restored
//! ```
//!
//! Both directions run the same pass order. Conversion never fails: text a
//! pass does not recognise is copied through unchanged, and malformed
//! constructs are reported as [`ConversionDiagnostic`]s next to the output.
//!
//! ## Modules
//!
//! - [`expression`]: Single variable expressions (`user.name` ↔ `$user->name`).
//! - [`inflector`]: Singular loop item names (`orders` → `order`).
//! - [`config`]: Configuration loading from `tagshift.toml`.
//! - [`project`]: Template discovery, conversion planning and writing.
//!
//! ## Quick Start
//!
//! ```rust
//! use tagshift_core::Direction;
//! use tagshift_core::convert_to_blade;
//! use tagshift_core::convert_to_merge_tags;
//!
//! let blade = convert_to_blade("{{#if user.isAdmin}}Hi {{user.name}}{{/if}}");
//! assert_eq!(blade, "@if($user->isAdmin)Hi {{ $user->name }}@endif");
//!
//! let merge_tags = convert_to_merge_tags(&blade);
//! assert_eq!(merge_tags, "{{#if user.isAdmin}}Hi {{user.name}}{{/if}}");
//!
//! let conversion = Direction::ToBlade.convert("{{#each items}}{{this}}");
//! assert_eq!(conversion.diagnostics.len(), 1);
//! ```

pub use config::*;
pub use conversion::*;
pub use error::*;
pub use project::*;
pub use to_blade::*;
pub use to_merge_tag::*;

pub mod config;
mod conversion;
#[allow(unused_assignments)]
mod error;
pub mod expression;
pub mod inflector;
pub mod project;
pub(crate) mod scanner;
mod to_blade;
mod to_merge_tag;
