use crate::canvas::Canvas;
use crate::error::{Result, ViewerError};
use crate::node::{Node, NodeKind};
use crate::tree::Document;
use image::RgbaImage;
use tiny_skia::Pixmap;
use log::{debug, trace};

impl Document {
    /// Flattens the whole document onto a fresh canvas-sized buffer.
    pub fn render_full(&self) -> Result<RgbaImage> {
        let mut canvas = Canvas::new(self.width(), self.height())?;
        self.draw_nodes(self.roots(), &mut canvas)?;
        debug!("rendered {}x{} document", self.width(), self.height());
        Ok(canvas.into_image())
    }

    /// Renders only the subtree rooted at `index`, at its own document offset.
    ///
    /// The root of the subtree is drawn as-is, at full opacity and regardless
    /// of its visibility flag; its descendants keep their own flags.
    pub fn render_region(&self, index: usize) -> Result<RgbaImage> {
        let node = self.node(index).ok_or_else(|| ViewerError::invalid_tree(format!("no node with index {}", index)))?;
        let mut canvas = Canvas::new(self.width(), self.height())?;
        match &node.kind {
            NodeKind::Layer { .. } => canvas.draw_pixmap(layer_image(node)?, node.bounds.left, node.bounds.top),
            NodeKind::Group { children, .. } => self.draw_nodes(children, &mut canvas)?,
        }
        Ok(canvas.into_image())
    }

    /// Paints `nodes` onto `target`, bottom of the list first.
    pub fn draw_nodes(&self, nodes: &[usize], target: &mut Canvas) -> Result<()> {
        for &i in nodes.iter().rev() {
            let node = self.node(i).ok_or_else(|| ViewerError::invalid_tree(format!("dangling child index {}", i)))?;
            if !node.visible {
                continue;
            }
            match &node.kind {
                NodeKind::Layer { .. } => self.draw_layer(node, target)?,
                NodeKind::Group { .. } => self.draw_group(node, target)?,
            }
        }
        Ok(())
    }

    fn draw_layer(&self, node: &Node, target: &mut Canvas) -> Result<()> {
        let image = layer_image(node)?;
        trace!("layer {} ({:?}) at {},{}", node.index, node.name, node.bounds.left, node.bounds.top);
        target.set_global_alpha(node.opacity);
        target.set_global_composite_operation(node.composite_op());
        target.draw_pixmap(image, node.bounds.left, node.bounds.top);
        Ok(())
    }

    fn draw_group(&self, node: &Node, target: &mut Canvas) -> Result<()> {
        if node.passthrough() {
            trace!("passthrough group {} ({:?})", node.index, node.name);
            return self.draw_nodes(node.children(), target);
        }
        trace!("isolated group {} ({:?})", node.index, node.name);
        let mut isolated = Canvas::new(self.width(), self.height())?;
        self.draw_nodes(node.children(), &mut isolated)?;
        target.set_global_alpha(node.opacity);
        target.set_global_composite_operation(node.composite_op());
        target.draw_canvas(&isolated, 0, 0);
        Ok(())
    }
}

fn layer_image(node: &Node) -> Result<&Pixmap> {
    node.image().ok_or_else(|| ViewerError::malformed(format!("layer {} ({:?}) has no image data", node.index, node.name)))
}

#[cfg(test)]
mod tests {
    use crate::error::ViewerError;
    use crate::node::{Node, NodeRecord};
    use crate::tree::build;
    use image::RgbaImage;
use tiny_skia::Pixmap;
    use serde_json::json;

    fn layer(i: usize, parent: Option<i64>, blend: &str, color: [u8; 4]) -> Node {
        let record: NodeRecord = serde_json::from_value(json!({
            "type": "layer", "blendMode": blend, "parentIndex": parent, "width": 2, "height": 2, "right": 2, "bottom": 2
        })).unwrap();
        Node::new(&record, i, Some(RgbaImage::from_pixel(2, 2, image::Rgba(color)))).unwrap()
    }

    fn group(i: usize, parent: Option<i64>, blend: &str) -> Node {
        let record: NodeRecord = serde_json::from_value(json!({ "type": "group", "blendMode": blend, "parentIndex": parent })).unwrap();
        Node::new(&record, i, None).unwrap()
    }

    #[test]
    fn first_declared_ends_on_top() {
        let doc = build(2, 2, vec![layer(0, None, "normal", [255, 0, 0, 255]), layer(1, None, "normal", [0, 0, 255, 255])]).unwrap();
        assert_eq!(doc.render_full().unwrap().get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn missing_image_aborts_the_render() {
        let record: NodeRecord = serde_json::from_value(json!({ "type": "layer" })).unwrap();
        let doc = build(2, 2, vec![Node::new(&record, 0, None).unwrap()]).unwrap();
        assert!(matches!(doc.render_full().unwrap_err(), ViewerError::MalformedNode(_)));
    }

    #[test]
    fn hidden_layer_without_image_is_skipped() {
        let record: NodeRecord = serde_json::from_value(json!({ "type": "layer", "visible": false })).unwrap();
        let doc = build(2, 2, vec![Node::new(&record, 0, None).unwrap()]).unwrap();
        assert!(doc.render_full().unwrap().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn region_of_group_contains_only_its_subtree() {
        let doc = build(2, 2, vec![
            group(0, None, "normal"),
            layer(1, Some(0), "normal", [0, 255, 0, 255]),
            layer(2, None, "normal", [255, 0, 0, 255]),
        ]).unwrap();
        assert_eq!(doc.render_region(0).unwrap().get_pixel(1, 1).0, [0, 255, 0, 255]);
        assert_eq!(doc.render_region(2).unwrap().get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert!(matches!(doc.render_region(3).unwrap_err(), ViewerError::InvalidTree(_)));
    }

    #[test]
    fn isolated_group_opacity_applies_once() {
        let mut g = group(0, None, "normal");
        g.opacity = 0.5;
        let doc = build(2, 2, vec![g, layer(1, Some(0), "normal", [255, 255, 255, 255]), layer(2, Some(0), "normal", [255, 255, 255, 255])]).unwrap();
        let alpha = doc.render_full().unwrap().get_pixel(0, 0).0[3];
        assert!((127..=128).contains(&alpha), "{}", alpha);
    }
}
