//! # Report Paint CLI
//!
//! Usage:
//!   report-paint input.json -o ops.json
//!   echo '{ ... }' | report-paint --dpi 300 --printer
//!   report-paint input.json --dump
//!   report-paint --example > report.json
//!
//! Verbosity follows `RUST_LOG`.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use report_paint::error::ReportError;
use report_paint::font::FontContext;
use report_paint::model::ReportDocument;
use report_paint::paint::{Painter, RecordingSurface};
use report_paint::units::{DeviceKind, DeviceMetrics};

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_report_json());
        return;
    }

    let dpi = |name: &str| {
        option(&args, name).map(|v| {
            v.parse::<f64>()
                .ok()
                .filter(|d| *d > 0.0)
                .unwrap_or_else(|| fail(&format!("{} expects a positive number, got '{}'", name, v)))
        })
    };

    let base = dpi("--dpi").unwrap_or(96.0);
    let metrics = DeviceMetrics {
        dpi_x: dpi("--dpi-x").unwrap_or(base),
        dpi_y: dpi("--dpi-y").unwrap_or(base),
        kind: if args.iter().any(|a| a == "--printer") {
            DeviceKind::Printer
        } else {
            DeviceKind::Screen
        },
    };

    if let Err(e) = run(&args, metrics) {
        fail(&e.to_string());
    }
}

fn run(args: &[String], metrics: DeviceMetrics) -> Result<(), ReportError> {
    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1])?
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    };

    let document = ReportDocument::from_json(&input)?;
    let mut font_context = FontContext::new();
    document.register_fonts(&mut font_context);

    let tree = report_paint::layout_document(&document, &font_context)?;
    if args.iter().any(|a| a == "--dump") {
        print!("{}", tree.dump());
        return Ok(());
    }

    let painter = Painter::new(&font_context, report_paint::render_options(&document, &tree));
    let mut surface = RecordingSurface::new(metrics);
    painter.draw_tree(&tree, &mut surface)?;

    let json = surface.to_json().map_err(io::Error::from)?;
    match option(args, "-o") {
        Some(path) => {
            fs::write(&path, &json)?;
            eprintln!("✓ Written {} draw ops to {}", surface.ops().len(), path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Value following `name`, if present.
fn option(args: &[String], name: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == name).map(|w| w[1].clone())
}

fn fail(message: &str) -> ! {
    eprintln!("✗ {}", message);
    process::exit(1);
}

fn example_report_json() -> &'static str {
    r##"{
  "page": "A5",
  "pageCount": 3,
  "selected": "total",
  "root": {
    "kind": { "type": "Report" },
    "inset": { "horizontal": 10, "vertical": 10 },
    "textStyle": { "font": { "family": "Helvetica", "size": 10 }, "color": "#222222" },
    "children": [
      {
        "layout": "Horizontal",
        "height": 20,
        "border": { "width": 0.5, "color": "#000000" },
        "children": [
          {
            "kind": { "type": "Text", "text": "Delivery note" },
            "width": 80,
            "textStyle": { "font": { "size": 16, "weight": 700 } }
          },
          {
            "kind": { "type": "Image", "payload": { "svg": { "content": "<svg><circle cx=\"10\" cy=\"10\" r=\"8\" fill=\"#800000\"/></svg>" } }, "suppressPrint": true },
            "width": 20,
            "fillRatio": 0
          }
        ]
      },
      {
        "fillRatio": 0.6,
        "fill": "#F4F4F4",
        "inset": { "horizontal": 2, "vertical": 2 },
        "children": [
          { "kind": { "type": "Text", "text": "Items are listed on the following pages." } },
          {
            "layout": "Horizontal",
            "height": 6,
            "children": [
              { "kind": { "type": "Check", "text": "@{check:1}" }, "width": 6 },
              { "kind": { "type": "Text", "text": "Checked by warehouse" }, "width": 60 }
            ]
          }
        ]
      },
      {
        "id": "total",
        "fillRatio": 0,
        "alignment": { "horizontal": "Right", "vertical": "Bottom" },
        "children": [
          { "kind": { "type": "Text", "text": "Page 1 of @{n}" }, "width": 40, "alignment": { "horizontal": "Right" } }
        ]
      }
    ]
  }
}
"##
}
