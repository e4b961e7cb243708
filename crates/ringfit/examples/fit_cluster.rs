use ringfit::{find_most_divergent_pair, fit_circle, fit_ellipse_edges, EdgePoint, FitConfig};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Edge points on a tilted ellipse, gradients pointing outward.
    let edges: Vec<EdgePoint> = (0..24)
        .map(|i| {
            let t = i as f64 * std::f64::consts::TAU / 24.0;
            let (x, y) = (200.0 + 40.0 * t.cos(), 150.0 + 22.0 * t.sin());
            EdgePoint::new(x.round() as i32, y.round() as i32, t.cos() as f32, t.sin() as f32)
        })
        .collect();
    let view: Vec<&EdgePoint> = edges.iter().collect();

    let pair = find_most_divergent_pair(&view, -0.5)?;
    println!(
        "most divergent pair: #{} / #{} (cos = {:.3})",
        pair.first_index, pair.second_index, pair.min_inner_product
    );
    if !pair.below_threshold {
        println!("cluster has too little angular spread; skipping fit");
        return Ok(());
    }

    let ellipse = fit_ellipse_edges(&view, &FitConfig::default())?;
    println!(
        "ellipse: center=({:.2}, {:.2}) a={:.2} b={:.2} angle={:.3}",
        ellipse.cx(),
        ellipse.cy(),
        ellipse.a(),
        ellipse.b(),
        ellipse.angle()
    );

    let circle = fit_circle(&view)?;
    println!(
        "circle:  center=({:.2}, {:.2}) r={:.2}",
        circle.cx(),
        circle.cy(),
        circle.a()
    );
    Ok(())
}
