//! Compiles declarative script collections into validated category trees.

pub mod call_compiler;
pub mod calls;
pub mod category_parser;
pub mod collection;
mod executable;
pub mod expressions;
pub mod functions;
pub mod script_compiler;
mod script_parser;
pub mod syntax;
pub mod validation;

pub use call_compiler::{compile_function_calls, CompiledCode};
pub use calls::{parse_function_calls, FunctionCall};
pub use category_parser::{
    parse_category, parse_category_with, CategoryParserUtilities, CollectionContext, IdAllocator,
};
pub use collection::{parse_collection, parse_collection_with, resolve_language};
pub use executable::{create_script_code, parse_docs, validate_name};
pub use expressions::{Pipe, Template};
pub use functions::{
    parse_shared_functions, FunctionBody, FunctionParameter, FunctionParameterCollection,
    SharedFunction, SharedFunctionRegistry,
};
pub use script_compiler::ScriptCompiler;
pub use syntax::{get_syntax, syntax_of, LanguageSyntax};
pub use validation::{validate_code, CodeLine, CodeValidationRule, InvalidCodeLine};
