//! End to end pipeline tests, markup in, pixels out
#![deny(warnings)]

use svgrast::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const SCENE: &str = r##"<svg width="16" height="16">
  <rect width="16" height="16" fill="#0000ff"/>
  <g fill="#ff0000">
    <circle cx="8" cy="8" r="5"/>
  </g>
</svg>"##;

#[test]
fn render_scene() {
    init_tracing();
    let document = Document::parse_str(SCENE).expect("valid document");
    let pixmap = document.render(Scale::ONE).expect("render succeeds");
    assert_eq!((pixmap.width(), pixmap.height()), (16, 16));
    // background shows in the corner, the circle at the center
    assert_eq!(pixmap.get(0, 0), Some(RGBA::new(0, 0, 255, 255)));
    assert_eq!(pixmap.get(8, 8), Some(RGBA::new(255, 0, 0, 255)));

    // doubled scale doubles the grid and keeps the colors
    let pixmap = document
        .render(Scale::from_tenths(20).expect("valid scale"))
        .expect("render succeeds");
    assert_eq!((pixmap.width(), pixmap.height()), (32, 32));
    assert_eq!(pixmap.get(1, 1), Some(RGBA::new(0, 0, 255, 255)));
    assert_eq!(pixmap.get(16, 16), Some(RGBA::new(255, 0, 0, 255)));
    assert_eq!(pixmap.as_bytes().len(), 32 * 32 * 4);
}

#[test]
fn render_is_deterministic() {
    init_tracing();
    let scale = Scale::from_tenths(17).expect("valid scale");
    let render = || {
        Document::parse_str(SCENE)
            .expect("valid document")
            .render(scale)
            .expect("render succeeds")
    };
    assert_eq!(render().as_bytes(), render().as_bytes());
}

#[test]
fn malformed_attributes_degrade() {
    init_tracing();
    let document = Document::parse_str(
        r##"<svg width="8" height="8">
             <rect width="8" height="8" fill="#00ff00"
                   transform="wobble(3)" stroke-width="bogus"/>
           </svg>"##,
    )
    .expect("valid document");
    let pixmap = document.render(Scale::ONE).expect("render succeeds");
    assert_eq!(pixmap.get(4, 4), Some(RGBA::new(0, 255, 0, 255)));
}

#[test]
fn load_matches_parse() {
    init_tracing();
    let from_reader = Document::load(std::io::Cursor::new(SCENE.as_bytes()))
        .expect("valid document")
        .render(Scale::ONE)
        .expect("render succeeds");
    let from_str = Document::parse_str(SCENE)
        .expect("valid document")
        .render(Scale::ONE)
        .expect("render succeeds");
    assert_eq!(from_reader.as_bytes(), from_str.as_bytes());
}
