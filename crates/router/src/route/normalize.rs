//! Turns route descriptors into compiled routes.

use super::slot::HandlerSlot;
use super::{Route, RouteConfig};
use crate::chain::Chain;
use crate::descriptor::{HandlerRef, MiddlewareSpec, RouteDescriptor};
use crate::error::RouteError;
use crate::handler::SharedHandler;
use crate::method::MethodSet;
use crate::module::{Export, ModuleRef};
use crate::pattern::CompiledPattern;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// `GET,POST /path => ./module#export`, both the method list and the handler are optional
static SHORTHAND_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:([A-Z]+(?:\s*,\s*[A-Z]+)*)\s+)?(.+?)(?:\s*=>\s*(.+?))?\s*$").expect("shorthand regex is valid")
});

/// Descriptor keys that are never copied into the route config
const RESERVED_KEYS: [&str; 7] = ["method", "route", "path", "methods", "handler", "matchOptions", "middleware"];

fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

struct Shorthand<'a> {
    methods: Option<Vec<&'a str>>,
    path: &'a str,
    handler: Option<&'a str>,
}

fn parse_shorthand(route: &str) -> Shorthand<'_> {
    match SHORTHAND_REGEX.captures(route) {
        Some(captures) => Shorthand {
            methods: captures.get(1).map(|m| m.as_str().split(',').map(str::trim).collect()),
            path: captures.get(2).map_or(route, |m| m.as_str()),
            handler: captures.get(3).map(|m| m.as_str()),
        },
        None => Shorthand { methods: None, path: route, handler: None },
    }
}

pub(crate) fn normalize<Req, Res>(descriptor: RouteDescriptor<Req, Res>) -> Result<Route<Req, Res>, RouteError> {
    let RouteDescriptor { path, route, method, methods, handler, middleware, match_options, metadata } = descriptor;

    let non_blank = |raw: &String| !raw.trim().is_empty();
    let raw = route.filter(non_blank).or(path.filter(non_blank)).ok_or(RouteError::MissingPath)?;
    let shorthand = parse_shorthand(&raw);
    let path = shorthand.path.to_string();

    let methods = match (shorthand.methods, method, methods) {
        (Some(tokens), _, _) => MethodSet::from_tokens(Some(tokens)),
        (None, Some(method), _) => MethodSet::from_tokens(Some([method])),
        (None, None, methods) => MethodSet::from_tokens(methods),
    };

    let handler = match shorthand.handler {
        Some(reference) => Some(HandlerRef::Module(ModuleRef::parse(reference))),
        None => handler,
    };

    let mut steps = Vec::with_capacity(middleware.len() + 1);
    for spec in middleware.into_iter().flatten() {
        if let Some(step) = resolve_middleware(&path, spec)? {
            steps.push(step);
        }
    }

    let mut metadata: Map<String, Value> = metadata.into_iter().filter(|(key, _)| !is_reserved(key)).collect();

    let slot = match handler {
        Some(HandlerRef::Direct(handler)) => {
            if let Some(extra) = handler.route_metadata() {
                let extra = extra.iter().filter(|(key, _)| !is_reserved(key));
                metadata.extend(extra.map(|(key, value)| (key.clone(), value.clone())));
            }
            steps.extend(handler.route_middleware().iter().cloned());
            steps.push(handler);
            HandlerSlot::Ready(Chain::build(steps).ok_or_else(|| RouteError::missing_handler(&path))?)
        }
        Some(HandlerRef::Module(module)) => HandlerSlot::deferred(module, steps),
        None => HandlerSlot::Ready(Chain::build(steps).ok_or_else(|| RouteError::missing_handler(&path))?),
    };

    let options = match_options.unwrap_or_default();
    let pattern = CompiledPattern::compile(&path, options).map_err(|e| RouteError::InvalidPattern {
        path: path.clone(),
        route: raw.clone(),
        reason: e.to_string(),
    })?;

    debug!(route = %raw, methods = ?methods.names(), keys = pattern.keys().len(), "compiled route");

    let config = Arc::new(RouteConfig::new(path, &methods, metadata));
    Ok(Route { pattern, methods, config, handler: slot })
}

fn resolve_middleware<Req, Res>(
    path: &str,
    spec: MiddlewareSpec<Req, Res>,
) -> Result<Option<SharedHandler<Req, Res>>, RouteError> {
    match spec {
        MiddlewareSpec::Direct(handler) => Ok(Some(handler)),
        MiddlewareSpec::FromModule { enabled: false, .. } | MiddlewareSpec::FromFactory { enabled: false, .. } => Ok(None),
        MiddlewareSpec::FromModule { module, method, .. } => match pick(path, &module, method.as_deref())? {
            Export::Handler(handler) => Ok(Some(Arc::clone(handler))),
            other => Err(RouteError::invalid_middleware(path, format!("expected a handler, found a {}", other.kind()))),
        },
        MiddlewareSpec::FromFactory { factory, method, arguments, .. } => match pick(path, &factory, method.as_deref())? {
            Export::Factory(factory) => {
                factory(arguments.as_slice()).map(Some).map_err(|e| RouteError::invalid_middleware(path, e))
            }
            other => Err(RouteError::invalid_middleware(path, format!("expected a factory, found a {}", other.kind()))),
        },
    }
}

fn pick<'e, Req, Res>(path: &str, export: &'e Export<Req, Res>, method: Option<&str>) -> Result<&'e Export<Req, Res>, RouteError> {
    match method {
        None => Ok(export),
        Some(name) => {
            export.get(name).ok_or_else(|| RouteError::invalid_middleware(path, format!("no export named \"{name}\"")))
        }
    }
}
