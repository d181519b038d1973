//! The JS/TS syntax tree shared between the parser, the cache, and the
//! linker, together with its stable wire form.
//!
//! Every module is parsed into one [`ast::JsAst`]: the statement tree split
//! into tree-shakable [`part::Part`]s, the file's symbol table, and the
//! lexical scope tree. Identifiers point into the symbol table via
//! [`symbol::Ref`] values that are unique across files, so the tables of all
//! parsed files merge without rewriting ids.
//!
//! The wire form ([`ast::SerializedAst`]) breaks the cyclic scope tree into
//! a flat, name-linked list and turns every ref-keyed map into a sorted
//! string-keyed map, which makes encoding deterministic.

pub mod ast;
pub mod binding;
pub mod class_or_func;
pub mod const_value;
pub mod css;
pub mod expr;
pub mod import_record;
pub mod module_type;
pub mod num;
pub mod op;
pub mod part;
pub mod scope;
pub mod stmt;
pub mod symbol;
