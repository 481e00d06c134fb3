//! Regex-based fact extraction per language.
//!
//! Analyzer dispatch is a closed, exhaustively-matched enum chosen by file
//! extension: `Primary` for JavaScript/TypeScript (full import/export and
//! symbol extraction), `Generic` for everything else (lexical import + def
//! scan). Both arms produce the same `FileFacts` shape, so downstream
//! phases never branch on language.
//!
//! Design rationale:
//! - Regex is "good enough" for structural facts and keeps the extractor
//!   free of per-language AST stacks
//! - Patterns focus on top-level statements; nested/obfuscated constructs
//!   degrade to "fewer facts", never to an error
//! - Line number tracking via byte offset -> newline counting

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extraction::complexity::approximate_complexity;
use crate::types::{ExportRef, FileFacts, ImportRef, Language, NodeId, Symbol};

/// Analyzer for one file, selected by language capability.
///
/// A closed tagged union instead of dynamic dispatch: adding a language
/// means adding a variant and the compiler finds every match that needs
/// updating.
#[derive(Debug, Clone, Copy)]
pub enum Analyzer {
    /// Full structural pass for JavaScript/TypeScript.
    Primary(PrimaryAnalyzer),
    /// Simpler lexical pass for secondary languages.
    Generic(GenericAnalyzer),
}

impl Analyzer {
    /// Pick the analyzer for a language. `None` means the file cannot
    /// contribute facts (unknown extension).
    pub fn for_language(language: Language) -> Option<Analyzer> {
        match language {
            Language::Unknown => None,
            lang if lang.is_primary() => Some(Analyzer::Primary(PrimaryAnalyzer { language: lang })),
            lang => Some(Analyzer::Generic(GenericAnalyzer { language: lang })),
        }
    }

    /// Run the analyzer over file content.
    pub fn analyze(&self, id: &str, content: &str, size: u64) -> FileFacts {
        match self {
            Analyzer::Primary(a) => a.analyze(id, content, size),
            Analyzer::Generic(a) => a.analyze(id, content, size),
        }
    }
}

/// Extract facts for a single file, or `None` if no analyzer handles it.
///
/// This is the per-file entry point used by the scan pipeline. It never
/// fails: malformed source degrades to partial (or empty) facts.
pub fn extract_facts(id: &NodeId, content: &str, language: Language, size: u64) -> Option<FileFacts> {
    Analyzer::for_language(language).map(|analyzer| analyzer.analyze(id, content, size))
}

/// Calculate 1-indexed line number from byte offset.
fn line_number(content: &str, byte_offset: usize) -> u32 {
    content[..byte_offset].matches('\n').count() as u32 + 1
}

// ---------------------------------------------------------------------------
// Primary analyzer: JavaScript / TypeScript
// ---------------------------------------------------------------------------

/// ES import statements: `import x from './a'`, `import { a } from 'b'`,
/// `import * as ns from 'c'`, bare `import './side-effect'`.
static JS_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:type\s+)?(?:[\w$*\s{},]+?\s+from\s+)?["']([^"']+)["']"#)
        .expect("js import pattern is valid")
});

/// Re-exports: `export * from './a'`, `export { a, b } from './c'`.
/// These are dependencies on the source module as much as imports are.
static JS_EXPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*export\s+(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s+from\s+["']([^"']+)["']"#)
        .expect("js export-from pattern is valid")
});

/// CommonJS: `require('./a')`.
static JS_REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\brequire\s*\(\s*["']([^"']+)["']\s*\)"#).expect("require pattern is valid")
});

/// Dynamic import with a literal specifier: `import('./a')`.
/// Non-literal arguments are runtime-constructed and out of scope.
static JS_DYNAMIC_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bimport\s*\(\s*["']([^"']+)["']\s*\)"#).expect("dynamic import pattern is valid")
});

/// Exported declarations: `export [default] [async] function/class/const ... name`.
static JS_EXPORT_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*export\s+(?:default\s+)?(?:async\s+)?(?:function\*?|class|const|let|var|interface|type|enum)\s+([A-Za-z_$][\w$]*)",
    )
    .expect("js export decl pattern is valid")
});

/// Brace export lists: `export { a, b as c }` (without `from`).
static JS_EXPORT_BRACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*export\s*\{([^}]*)\}\s*;?\s*$").expect("js export brace pattern is valid")
});

/// Function declarations, including exported and async ones.
static JS_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\*?\s+([A-Za-z_$][\w$]*)")
        .expect("js function pattern is valid")
});

/// Arrow functions bound to a top-level name.
static JS_ARROW_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:\([^)\n]*\)|[A-Za-z_$][\w$]*)\s*=>",
    )
    .expect("js arrow fn pattern is valid")
});

/// Top-level variable declarations.
static JS_VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)")
        .expect("js variable pattern is valid")
});

#[derive(Debug, Clone, Copy)]
pub struct PrimaryAnalyzer {
    pub language: Language,
}

impl PrimaryAnalyzer {
    fn analyze(&self, id: &str, content: &str, size: u64) -> FileFacts {
        let mut imports = Vec::new();
        let mut seen_specifiers: Vec<(String, bool)> = Vec::new();

        for caps in JS_IMPORT.captures_iter(content) {
            seen_specifiers.push((caps[1].to_string(), false));
        }
        for caps in JS_EXPORT_FROM.captures_iter(content) {
            seen_specifiers.push((caps[1].to_string(), false));
        }
        for caps in JS_REQUIRE.captures_iter(content) {
            seen_specifiers.push((caps[1].to_string(), false));
        }
        for caps in JS_DYNAMIC_IMPORT.captures_iter(content) {
            seen_specifiers.push((caps[1].to_string(), true));
        }
        for (specifier, is_dynamic) in seen_specifiers {
            imports.push(ImportRef::raw(specifier, is_dynamic));
        }

        let mut exports = Vec::new();
        for caps in JS_EXPORT_DECL.captures_iter(content) {
            let m = caps.get(1).expect("capture group 1 exists");
            exports.push(ExportRef {
                name: m.as_str().to_string(),
                line: line_number(content, m.start()),
            });
        }
        for caps in JS_EXPORT_BRACE.captures_iter(content) {
            let list = caps.get(1).expect("capture group 1 exists");
            let line = line_number(content, list.start());
            for entry in list.as_str().split(',') {
                // `a as b` exports the alias name
                let name = entry.rsplit(" as ").next().unwrap_or(entry).trim();
                if !name.is_empty() {
                    exports.push(ExportRef { name: name.to_string(), line });
                }
            }
        }

        let mut functions = Vec::new();
        for caps in JS_FUNCTION.captures_iter(content).chain(JS_ARROW_FN.captures_iter(content)) {
            let m = caps.get(1).expect("capture group 1 exists");
            functions.push(Symbol {
                name: m.as_str().to_string(),
                line: line_number(content, m.start()),
            });
        }

        let mut variables = Vec::new();
        for caps in JS_VARIABLE.captures_iter(content) {
            let m = caps.get(1).expect("capture group 1 exists");
            let name = m.as_str();
            // Arrow-function bindings already live in `functions`
            if functions.iter().any(|f| f.name == name) {
                continue;
            }
            variables.push(Symbol {
                name: name.to_string(),
                line: line_number(content, m.start()),
            });
        }

        FileFacts {
            id: id.to_string(),
            language: self.language,
            lines: content.lines().count() as u32,
            size,
            complexity: approximate_complexity(content),
            imports,
            exports,
            functions,
            variables,
        }
    }
}

// ---------------------------------------------------------------------------
// Generic analyzer: secondary languages, lexical pass
// ---------------------------------------------------------------------------

static PY_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*import\s+([\w.]+)").expect("py import pattern is valid"));

static PY_FROM_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*from\s+(\.*[\w.]*)\s+import\b").expect("py from-import pattern is valid")
});

static PY_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:(?:async\s+)?def|class)\s+(\w+)").expect("py def pattern is valid")
});

static PY_MODULE_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([A-Za-z_]\w*)\s*=[^=]").expect("py var pattern is valid"));

static RUST_USE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:pub\s+)?use\s+([A-Za-z_][\w]*)").expect("rust use pattern is valid")
});

static RUST_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+(\w+)")
        .expect("rust fn pattern is valid")
});

static RUST_CONST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?(?:static|const)\s+(\w+)")
        .expect("rust const pattern is valid")
});

static GO_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*(?:import\s+)?(?:[A-Za-z_]\w*\s+)?"([^"]+)"\s*$"#)
        .expect("go import pattern is valid")
});

static GO_FUNC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^func\s+(?:\([^)]*\)\s*)?(\w+)").expect("go func pattern is valid")
});

static JAVA_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*import\s+(?:static\s+)?([\w.]+)\s*;").expect("java import pattern is valid")
});

static JAVA_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:public\s+|final\s+|abstract\s+)*(?:class|interface|enum)\s+(\w+)")
        .expect("java type pattern is valid")
});

static RUBY_REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*require(_relative)?\s+["']([^"']+)["']"#)
        .expect("ruby require pattern is valid")
});

static RUBY_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:def|class|module)\s+(\w+)").expect("ruby def pattern is valid")
});

#[derive(Debug, Clone, Copy)]
pub struct GenericAnalyzer {
    pub language: Language,
}

impl GenericAnalyzer {
    fn analyze(&self, id: &str, content: &str, size: u64) -> FileFacts {
        let mut imports = Vec::new();
        let mut functions = Vec::new();
        let mut variables = Vec::new();

        match self.language {
            Language::Python => {
                for caps in PY_IMPORT.captures_iter(content) {
                    imports.push(ImportRef::raw(normalize_python_module(&caps[1]), false));
                }
                for caps in PY_FROM_IMPORT.captures_iter(content) {
                    imports.push(ImportRef::raw(normalize_python_module(&caps[1]), false));
                }
                for caps in PY_DEF.captures_iter(content) {
                    let m = caps.get(1).expect("capture group 1 exists");
                    functions.push(Symbol {
                        name: m.as_str().to_string(),
                        line: line_number(content, m.start()),
                    });
                }
                for caps in PY_MODULE_VAR.captures_iter(content) {
                    let m = caps.get(1).expect("capture group 1 exists");
                    if functions.iter().all(|f| f.name != m.as_str()) {
                        variables.push(Symbol {
                            name: m.as_str().to_string(),
                            line: line_number(content, m.start()),
                        });
                    }
                }
            }
            Language::Rust => {
                for caps in RUST_USE.captures_iter(content) {
                    let root = &caps[1];
                    // `use crate::..` / `use super::..` are intra-crate paths the
                    // lexical pass cannot map to files; only foreign crates
                    // become dependency edges.
                    if !matches!(root, "crate" | "self" | "super" | "std" | "core" | "alloc") {
                        imports.push(ImportRef::raw(root, false));
                    }
                }
                for caps in RUST_FN.captures_iter(content) {
                    let m = caps.get(1).expect("capture group 1 exists");
                    functions.push(Symbol {
                        name: m.as_str().to_string(),
                        line: line_number(content, m.start()),
                    });
                }
                for caps in RUST_CONST.captures_iter(content) {
                    let m = caps.get(1).expect("capture group 1 exists");
                    variables.push(Symbol {
                        name: m.as_str().to_string(),
                        line: line_number(content, m.start()),
                    });
                }
            }
            Language::Go => {
                for caps in GO_IMPORT.captures_iter(content) {
                    imports.push(ImportRef::raw(&caps[1], false));
                }
                for caps in GO_FUNC.captures_iter(content) {
                    let m = caps.get(1).expect("capture group 1 exists");
                    functions.push(Symbol {
                        name: m.as_str().to_string(),
                        line: line_number(content, m.start()),
                    });
                }
            }
            Language::Java => {
                for caps in JAVA_IMPORT.captures_iter(content) {
                    imports.push(ImportRef::raw(&caps[1], false));
                }
                for caps in JAVA_TYPE.captures_iter(content) {
                    let m = caps.get(1).expect("capture group 1 exists");
                    functions.push(Symbol {
                        name: m.as_str().to_string(),
                        line: line_number(content, m.start()),
                    });
                }
            }
            Language::Ruby => {
                for caps in RUBY_REQUIRE.captures_iter(content) {
                    let relative = caps.get(1).is_some();
                    let spec = &caps[2];
                    let specifier = if relative && !spec.starts_with('.') {
                        format!("./{spec}")
                    } else {
                        spec.to_string()
                    };
                    imports.push(ImportRef::raw(specifier, false));
                }
                for caps in RUBY_DEF.captures_iter(content) {
                    let m = caps.get(1).expect("capture group 1 exists");
                    functions.push(Symbol {
                        name: m.as_str().to_string(),
                        line: line_number(content, m.start()),
                    });
                }
            }
            // Primary languages never reach the generic analyzer and
            // Unknown never gets an analyzer at all.
            Language::JavaScript | Language::TypeScript | Language::Unknown => {}
        }

        FileFacts {
            id: id.to_string(),
            language: self.language,
            lines: content.lines().count() as u32,
            size,
            complexity: approximate_complexity(content),
            imports,
            // The lexical pass has no reliable export notion; declared
            // symbols carry the signal instead.
            exports: Vec::new(),
            functions,
            variables,
        }
    }
}

/// Map Python module notation onto path-style specifiers so the resolver
/// can treat them uniformly: `.utils` -> `./utils`, `..core.db` ->
/// `../core/db`, `requests` stays as-is (external).
fn normalize_python_module(module: &str) -> String {
    let dots = module.len() - module.trim_start_matches('.').len();
    let rest = module.trim_start_matches('.').replace('.', "/");
    match dots {
        0 => rest,
        1 => format!("./{rest}"),
        n => {
            let ups = "../".repeat(n - 1);
            format!("{ups}{rest}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primary(content: &str) -> FileFacts {
        extract_facts(&"src/app.ts".to_string(), content, Language::TypeScript, content.len() as u64)
            .expect("typescript has an analyzer")
    }

    #[test]
    fn test_es_imports() {
        let facts = primary(
            r#"
import React from 'react';
import { api } from './api/client';
import * as utils from '../utils';
import './side-effect';
"#,
        );
        let specs: Vec<_> = facts.imports.iter().map(|i| i.raw_specifier.as_str()).collect();
        assert_eq!(specs, vec!["react", "./api/client", "../utils", "./side-effect"]);
    }

    #[test]
    fn test_reexport_and_require_and_dynamic() {
        let facts = primary(
            r#"
export * from './models';
export { a, b } from './helpers';
const legacy = require('./legacy');
const lazy = import('./lazy');
"#,
        );
        let specs: Vec<_> = facts.imports.iter().map(|i| i.raw_specifier.as_str()).collect();
        assert_eq!(specs, vec!["./models", "./helpers", "./legacy", "./lazy"]);
        assert!(facts.imports[3].is_dynamic);
        assert!(!facts.imports[2].is_dynamic);
    }

    #[test]
    fn test_exports_and_symbols() {
        let facts = primary(
            r#"
export function renderPage(props) {}
export const PAGE_SIZE = 25;
export class PageController {}
const formatTitle = (t) => t.trim();
let internalState = {};
export { formatTitle };
"#,
        );
        let export_names: Vec<_> = facts.exports.iter().map(|e| e.name.as_str()).collect();
        assert!(export_names.contains(&"renderPage"));
        assert!(export_names.contains(&"PAGE_SIZE"));
        assert!(export_names.contains(&"PageController"));
        assert!(export_names.contains(&"formatTitle"));

        let fn_names: Vec<_> = facts.functions.iter().map(|f| f.name.as_str()).collect();
        assert!(fn_names.contains(&"renderPage"));
        assert!(fn_names.contains(&"formatTitle"));

        let var_names: Vec<_> = facts.variables.iter().map(|v| v.name.as_str()).collect();
        assert!(var_names.contains(&"PAGE_SIZE"));
        assert!(var_names.contains(&"internalState"));
        // Arrow function binding must not double as a variable
        assert!(!var_names.contains(&"formatTitle"));
    }

    #[test]
    fn test_export_alias_uses_alias_name() {
        let facts = primary("export { internalName as publicName };\n");
        let names: Vec<_> = facts.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["publicName"]);
    }

    #[test]
    fn test_line_numbers() {
        let facts = primary("const a = 1;\nexport function f() {}\n");
        assert_eq!(facts.exports[0].line, 2);
        assert_eq!(facts.lines, 2);
    }

    #[test]
    fn test_python_generic() {
        let content = "import os\nfrom .utils import helper\nfrom ..core.db import connect\n\ndef main():\n    pass\n\nVERSION = '1.0'\n";
        let facts =
            extract_facts(&"app.py".to_string(), content, Language::Python, content.len() as u64)
                .expect("python has an analyzer");
        let specs: Vec<_> = facts.imports.iter().map(|i| i.raw_specifier.as_str()).collect();
        assert_eq!(specs, vec!["os", "./utils", "../core/db"]);
        assert_eq!(facts.functions[0].name, "main");
        assert_eq!(facts.variables[0].name, "VERSION");
    }

    #[test]
    fn test_rust_generic_skips_intra_crate_paths() {
        let content = "use serde::Serialize;\nuse crate::config;\nuse std::path::Path;\n\npub fn run() {}\n";
        let facts =
            extract_facts(&"lib.rs".to_string(), content, Language::Rust, content.len() as u64)
                .expect("rust has an analyzer");
        let specs: Vec<_> = facts.imports.iter().map(|i| i.raw_specifier.as_str()).collect();
        assert_eq!(specs, vec!["serde"]);
        assert_eq!(facts.functions[0].name, "run");
    }

    #[test]
    fn test_ruby_require_relative() {
        let content = "require 'json'\nrequire_relative 'helpers/format'\n";
        let facts =
            extract_facts(&"main.rb".to_string(), content, Language::Ruby, content.len() as u64)
                .expect("ruby has an analyzer");
        let specs: Vec<_> = facts.imports.iter().map(|i| i.raw_specifier.as_str()).collect();
        assert_eq!(specs, vec!["json", "./helpers/format"]);
    }

    #[test]
    fn test_unknown_language_contributes_no_facts() {
        assert!(extract_facts(&"data.bin".to_string(), "xx", Language::Unknown, 2).is_none());
    }

    #[test]
    fn test_normalize_python_module() {
        assert_eq!(normalize_python_module("requests"), "requests");
        assert_eq!(normalize_python_module(".utils"), "./utils");
        assert_eq!(normalize_python_module("..core.db"), "../core/db");
        assert_eq!(normalize_python_module("pkg.sub"), "pkg/sub");
    }
}
