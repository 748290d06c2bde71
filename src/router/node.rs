// Route trie node
// One node per path segment position; lookup cost is proportional to the
// number of segments in the request path, not to the number of routes.

use std::collections::HashMap;

use super::Segment;

pub(super) struct Node<T> {
    static_children: HashMap<String, Node<T>>,
    param: Option<Box<ParamChild<T>>>,
    wildcard: Option<WildcardLeaf<T>>,
    leaf: Option<T>,
}

struct ParamChild<T> {
    name: String,
    node: Node<T>,
}

struct WildcardLeaf<T> {
    name: String,
    value: T,
}

/// Insert-time overlap that cannot be registered. Mapped to
/// `RouteError::Conflict` by the router, which knows the full pattern.
pub(super) struct Occupied;

impl<T> Node<T> {
    pub(super) fn new() -> Self {
        Self {
            static_children: HashMap::new(),
            param: None,
            wildcard: None,
            leaf: None,
        }
    }

    /// Insert `value` at the position described by `segments`.
    ///
    /// Fails when the terminal is already taken, when a parameter at the same
    /// position was registered under a different name, or when a second
    /// wildcard lands on the same node. Intermediate nodes created before a
    /// conflict is detected carry no value and never affect matching.
    pub(super) fn insert(&mut self, segments: &[Segment<'_>], value: T) -> Result<(), Occupied> {
        let Some((segment, rest)) = segments.split_first() else {
            if self.leaf.is_some() {
                return Err(Occupied);
            }
            self.leaf = Some(value);
            return Ok(());
        };

        match segment {
            Segment::Literal(literal) => self
                .static_children
                .entry((*literal).to_string())
                .or_insert_with(Self::new)
                .insert(rest, value),
            Segment::Param(name) => {
                if let Some(param) = self.param.as_deref_mut() {
                    if param.name == *name {
                        return param.node.insert(rest, value);
                    }
                    return Err(Occupied);
                }
                let param = self.param.get_or_insert_with(|| {
                    Box::new(ParamChild {
                        name: (*name).to_string(),
                        node: Self::new(),
                    })
                });
                param.node.insert(rest, value)
            }
            Segment::Wildcard(name) => {
                if self.wildcard.is_some() {
                    return Err(Occupied);
                }
                self.wildcard = Some(WildcardLeaf {
                    name: (*name).to_string(),
                    value,
                });
                Ok(())
            }
        }
    }

    /// Walk the remaining `segments`, collecting captures into `params`.
    ///
    /// At every position a static child is tried first, then the parameter
    /// child, then the wildcard; failed branches are backtracked so the
    /// priority order never hides a route that would otherwise match.
    pub(super) fn find<'n>(
        &'n self,
        segments: &[&str],
        params: &mut Vec<(String, String)>,
    ) -> Option<&'n T> {
        let Some((segment, rest)) = segments.split_first() else {
            if let Some(value) = &self.leaf {
                return Some(value);
            }
            if let Some(wildcard) = &self.wildcard {
                params.push((wildcard.name.clone(), String::new()));
                return Some(&wildcard.value);
            }
            return None;
        };

        if let Some(child) = self.static_children.get(*segment) {
            if let Some(value) = child.find(rest, params) {
                return Some(value);
            }
        }

        if !segment.is_empty() {
            if let Some(param) = &self.param {
                params.push((param.name.clone(), (*segment).to_string()));
                if let Some(value) = param.node.find(rest, params) {
                    return Some(value);
                }
                params.pop();
            }
        }

        if let Some(wildcard) = &self.wildcard {
            params.push((wildcard.name.clone(), segments.join("/")));
            return Some(&wildcard.value);
        }

        None
    }
}
