//! Links between discussion messages and the annotations they refer to.
//!
//! Links are stored on the message side and may outlive the annotations
//! they point at; a dangling link resolves to [`LinkTarget::Missing`].

use crate::shapes::{Annotation, AnnotationId};
use serde::{Deserialize, Serialize};

/// Annotation references carried by one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLinks {
    pub message_id: String,
    #[serde(default)]
    pub annotation_ids: Vec<AnnotationId>,
}

impl MessageLinks {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            annotation_ids: Vec::new(),
        }
    }

    pub fn links_to(&self, id: &AnnotationId) -> bool {
        self.annotation_ids.contains(id)
    }

    /// Link or unlink `id`. Returns whether it is linked afterwards.
    pub fn toggle(&mut self, id: AnnotationId) -> bool {
        if let Some(index) = self.annotation_ids.iter().position(|a| *a == id) {
            self.annotation_ids.remove(index);
            false
        } else {
            self.annotation_ids.push(id);
            true
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkTarget<'a> {
    Present(&'a Annotation),
    Missing(&'a AnnotationId),
}

/// Resolve each linked id against the current annotations, in link order.
pub fn resolve_links<'a>(ids: &'a [AnnotationId], annotations: &'a [Annotation]) -> Vec<LinkTarget<'a>> {
    ids.iter()
        .map(|id| match annotations.iter().find(|a| &a.id == id) {
            Some(annotation) => LinkTarget::Present(annotation),
            None => LinkTarget::Missing(id),
        })
        .collect()
}

/// Messages that link to `id`.
pub fn messages_linking<'a>(
    messages: &'a [MessageLinks],
    id: &'a AnnotationId,
) -> impl Iterator<Item = &'a MessageLinks> + 'a {
    messages.iter().filter(move |m| m.links_to(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Frame;
    use crate::shapes::{AnnotationDraft, BoxKind, BoxShape, Shape, ShapeStyle};

    fn annotation(id: &str) -> Annotation {
        AnnotationDraft::new(
            Shape::Box(BoxShape::new(BoxKind::Star, Frame::new(0.0, 0.0, 10.0, 10.0))),
            ShapeStyle::default(),
            "ana",
        )
        .into_annotation(AnnotationId::from(id))
    }

    #[test]
    fn test_dangling_links_resolve_to_missing() {
        let annotations = vec![annotation("kept")];
        let ids = vec![AnnotationId::from("deleted"), AnnotationId::from("kept")];
        let resolved = resolve_links(&ids, &annotations);
        assert_eq!(resolved.len(), 2);
        assert!(matches!(resolved[0], LinkTarget::Missing(id) if id.as_str() == "deleted"));
        assert!(matches!(resolved[1], LinkTarget::Present(a) if a.id.as_str() == "kept"));
    }

    #[test]
    fn test_toggle_link() {
        let mut links = MessageLinks::new("m1");
        assert!(links.toggle(AnnotationId::from("a")));
        assert!(links.links_to(&AnnotationId::from("a")));
        assert!(!links.toggle(AnnotationId::from("a")));
        assert!(links.annotation_ids.is_empty());
    }

    #[test]
    fn test_reverse_lookup() {
        let mut first = MessageLinks::new("m1");
        first.toggle(AnnotationId::from("a"));
        let second = MessageLinks::new("m2");
        let messages = vec![first, second];
        let target = AnnotationId::from("a");
        let ids: Vec<_> = messages_linking(&messages, &target).map(|m| m.message_id.as_str()).collect();
        assert_eq!(ids, vec!["m1"]);
    }
}
