//! Translation from REST-style paths to ZenTao module/function calls.
//!
//! ZenTao's classic API addresses everything as `?m=<module>&f=<function>`
//! with parameters in the query string. Callers speak in resource paths
//! (`GET /products/123`), and this module maps the known path shapes onto
//! module/function pairs through fixed tables. Anything not in the tables is
//! rejected rather than guessed.

use std::collections::BTreeMap;

use reqwest::Method;

use super::error::{ApiError, Result};

/// A resolved ZenTao call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedCall {
    /// The ZenTao module (`m`).
    pub module: &'static str,
    /// The ZenTao function (`f`).
    pub function: &'static str,
    /// Identifiers pulled out of the path, keyed by their ZenTao parameter name.
    pub params: BTreeMap<String, String>,
}

impl TranslatedCall {
    /// The `?m=<module>&f=<function>` query string.
    pub fn query(&self) -> String {
        format!("?m={}&f={}", self.module, self.function)
    }
}

/// Top-level collections: path segment and the module that serves it.
const RESOURCES: &[(&str, &str)] = &[
    ("programs", "program"),
    ("products", "product"),
    ("projects", "project"),
    ("executions", "execution"),
    ("stories", "story"),
    ("tasks", "task"),
    ("bugs", "bug"),
    ("productplans", "productplan"),
    ("releases", "release"),
    ("builds", "build"),
    ("testcases", "testcase"),
    ("testtasks", "testtask"),
    ("users", "user"),
    ("departments", "dept"),
    ("docs", "doc"),
];

/// Collections nested under a parent: parent segment, child segment, child
/// module, and the parameter name the parent's identifier is passed as.
const NESTED: &[(&str, &str, &str, &str)] = &[
    ("programs", "products", "product", "program"),
    ("programs", "projects", "project", "program"),
    ("products", "projects", "project", "product"),
    ("products", "stories", "story", "product"),
    ("products", "bugs", "bug", "product"),
    ("products", "plans", "productplan", "product"),
    ("products", "releases", "release", "product"),
    ("products", "testcases", "testcase", "product"),
    ("projects", "executions", "execution", "project"),
    ("projects", "stories", "story", "project"),
    ("projects", "builds", "build", "project"),
    ("executions", "tasks", "task", "execution"),
    ("executions", "stories", "story", "execution"),
    ("executions", "builds", "build", "execution"),
];

/// Actions on a single item: collection segment, action segment, function.
const ACTIONS: &[(&str, &str, &str)] = &[
    ("stories", "close", "close"),
    ("stories", "activate", "activate"),
    ("tasks", "start", "start"),
    ("tasks", "finish", "finish"),
    ("tasks", "close", "close"),
    ("tasks", "activate", "activate"),
    ("bugs", "resolve", "resolve"),
    ("bugs", "confirm", "confirmBug"),
    ("bugs", "close", "close"),
    ("bugs", "activate", "activate"),
    ("executions", "start", "start"),
    ("executions", "close", "close"),
    ("projects", "start", "start"),
    ("projects", "close", "close"),
];

/// Translate a verb and REST-style path into a ZenTao call.
///
/// A query string or fragment on `path` is ignored. Empty segments from
/// doubled or trailing slashes are skipped.
///
/// # Errors
///
/// Returns `ApiError::Translation` when the verb/path shape is not mapped.
pub fn translate(method: &Method, path: &str) -> Result<TranslatedCall> {
    let path_only = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path_only.split('/').filter(|s| !s.is_empty()).collect();

    resolve(method, &segments).ok_or_else(|| ApiError::Translation {
        method: method.to_string(),
        path: path.to_string(),
    })
}

fn resolve(method: &Method, segments: &[&str]) -> Option<TranslatedCall> {
    match *segments {
        [collection] => {
            let module = module_for(collection)?;
            let function = match *method {
                Method::GET => "browse",
                Method::POST => "create",
                _ => return None,
            };
            Some(call(module, function, []))
        }
        [collection, id] => {
            let module = module_for(collection)?;
            let function = match *method {
                Method::GET => "view",
                Method::PUT => "edit",
                Method::DELETE => "delete",
                _ => return None,
            };
            Some(call(module, function, [("id", id)]))
        }
        [parent, id, child] => {
            if let Some(&(_, _, module, key)) = NESTED
                .iter()
                .find(|(p, c, _, _)| *p == parent && *c == child)
            {
                let function = match *method {
                    Method::GET => "browse",
                    Method::POST => "create",
                    _ => return None,
                };
                return Some(call(module, function, [(key, id)]));
            }

            let &(_, _, function) = ACTIONS
                .iter()
                .find(|(c, a, _)| *c == parent && *a == child)?;
            if *method != Method::POST && *method != Method::PUT {
                return None;
            }
            Some(call(module_for(parent)?, function, [("id", id)]))
        }
        _ => None,
    }
}

fn module_for(collection: &str) -> Option<&'static str> {
    RESOURCES
        .iter()
        .find(|(segment, _)| *segment == collection)
        .map(|&(_, module)| module)
}

fn call<const N: usize>(
    module: &'static str,
    function: &'static str,
    params: [(&str, &str); N],
) -> TranslatedCall {
    TranslatedCall {
        module,
        function,
        params: params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}
