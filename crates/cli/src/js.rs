use std::fs;
use std::path::Path;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CodegenReturn};
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions, MinifierReturn};
use oxc::parser::{Parser, ParserReturn};
use oxc::semantic::{SemanticBuilder, SemanticBuilderReturn};
use oxc::span::SourceType;
use oxc::transformer::{TransformOptions, Transformer, TransformerReturn};

use crate::log;
use crate::report::{Error, ErrorExt, Report};

/// Transpile and minify the bundle entry module in place.
pub fn minify_file(path: &Path) -> Report<()> {
    let source =
        fs::read_to_string(path).with_message(|| format!("failed to read {}", path.display()))?;

    let code = minify(&source, path)?;

    log::info!(
        "minified {} from {} to {} bytes",
        path.display(),
        source.len(),
        code.len()
    );

    fs::write(path, code).with_message(|| format!("failed to write {} file", path.display()))
}

pub fn minify(source: &str, source_path: &Path) -> Report<String> {
    // Memory arena where AST nodes are allocated.
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(true);

    let ParserReturn {
        mut program,
        errors,
        panicked,
        ..
    } = Parser::new(&allocator, source, source_type).parse();

    if panicked || !errors.is_empty() {
        return Err(failed("parse", source_path, &errors));
    }

    let SemanticBuilderReturn { semantic, errors } = SemanticBuilder::new().build(&program);

    if !errors.is_empty() {
        return Err(failed("analyze", source_path, &errors));
    }

    let (symbols, scopes) = semantic.into_symbol_table_and_scope_tree();

    let TransformerReturn { errors, .. } =
        Transformer::new(&allocator, source_path, TransformOptions::default())
            .build_with_symbols_and_scopes(symbols, scopes, &mut program);

    if !errors.is_empty() {
        return Err(failed("transform", source_path, &errors));
    }

    let options = MinifierOptions {
        mangle: true,
        compress: CompressOptions::all_true(),
    };

    let MinifierReturn { mangler } = Minifier::new(options).build(&allocator, &mut program);

    let options = CodegenOptions {
        minify: true,
        single_quote: true,
        comments: false,
        annotation_comments: false,
        ..CodegenOptions::default()
    };

    let CodegenReturn { code, .. } = Codegen::new()
        .with_options(options)
        .with_mangler(mangler)
        .build(&program);

    Ok(code)
}

fn failed<D>(stage: &str, path: &Path, errors: &[D]) -> Error
where
    D: std::fmt::Debug,
{
    let mut message = format!("failed to {stage} {}", path.display());

    for err in errors {
        message.push_str(&format!("\n{err:?}"));
    }

    Error::message(message)
}
