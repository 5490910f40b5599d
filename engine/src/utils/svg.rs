use crate::tree::STree;
use rst_common::geom::gcell::GCell;
use std::fs::File;
use std::io::{BufWriter, Write};

const SCALE: f32 = 50.0;
const OBJ_SIZE: f32 = 10.0;

/// Writes the tree as an SVG 1.1 document for eyeballing: 50 units
/// per grid cell with a one-cell margin, a red square for the source,
/// blue squares for ports, black discs for Steiner points, and
/// arrowed polylines from each uphill to its child.
pub fn dump_svg(tree: &STree, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut out = BufWriter::new(file);

    writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>")?;
    if tree.is_empty() {
        writeln!(
            out,
            "<svg viewBox=\"0 0 {s} {s}\" width=\"{s}\" height=\"{s}\" xmlns=\"http://www.w3.org/2000/svg\"/>",
            s = SCALE
        )?;
        return Ok(());
    }

    let x0 = tree.bounds.x0 as f32 - 1.0;
    let y0 = tree.bounds.y0 as f32 - 1.0;
    let width = (tree.bounds.x1 as f32 - x0 + 1.0) * SCALE;
    let height = (tree.bounds.y1 as f32 - y0 + 1.0) * SCALE;
    let map = |c: GCell| ((c.x as f32 - x0) * SCALE, (c.y as f32 - y0) * SCALE);

    writeln!(
        out,
        "<svg viewBox=\"0 0 {} {}\" width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">",
        width, height, width, height
    )?;
    writeln!(out, "<defs>")?;
    writeln!(
        out,
        "<marker id=\"arrowhead\" markerWidth=\"10\" markerHeight=\"7\" refX=\"0\" refY=\"3.5\" orient=\"auto\">"
    )?;
    writeln!(out, "    <polygon points=\"0 0, 10 3.5, 0 7\" />")?;
    writeln!(out, "  </marker>")?;
    writeln!(out, "</defs>")?;
    writeln!(
        out,
        "<rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" stroke=\"#fff\" fill=\"#fff\"/>"
    )?;

    for (&cell, node) in &tree.nodes {
        let Some(up) = node.uphill else { continue };
        let (ux, uy) = map(up);
        let (cx, cy) = map(cell);
        writeln!(
            out,
            "<polyline points=\"{},{} {},{} {},{}\" stroke=\"black\" marker-mid=\"url(#arrowhead)\"/>",
            ux,
            uy,
            (ux + cx) / 2.0,
            (uy + cy) / 2.0,
            cx,
            cy
        )?;
    }

    for (&cell, node) in &tree.nodes {
        let (cx, cy) = map(cell);
        if Some(cell) == tree.source {
            writeln!(
                out,
                "<rect x=\"{}\" y=\"{}\" width=\"{w}\" height=\"{w}\" style=\"fill:red;stroke:black;stroke-width:1\" />",
                cx - OBJ_SIZE / 2.0,
                cy - OBJ_SIZE / 2.0,
                w = OBJ_SIZE
            )?;
        } else if node.port_count > 0 {
            writeln!(
                out,
                "<rect x=\"{}\" y=\"{}\" width=\"{w}\" height=\"{w}\" style=\"fill:blue;stroke:black;stroke-width:1\" />",
                cx - OBJ_SIZE / 2.0,
                cy - OBJ_SIZE / 2.0,
                w = OBJ_SIZE
            )?;
        } else {
            writeln!(
                out,
                "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" style=\"fill:black;stroke:black;stroke-width:1\" />",
                cx,
                cy,
                OBJ_SIZE / 2.0
            )?;
        }
    }
    writeln!(out, "</svg>")?;
    Ok(())
}
