//! Example usage of the smoothing crate

use nalgebra::DMatrix;
use sg_movmean::{movmean, movmean2, movmean_2d, smooth_sg, smooth_wsg, SavitzkyGolayFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Savitzky-Golay / moving average examples ===\n");

    let clean_signal: Vec<f64> = (0..24)
        .map(|i| {
            let x = i as f64 * 0.1;
            (2.0 * std::f64::consts::PI * x).sin() + 0.5 * (4.0 * std::f64::consts::PI * x).cos()
        })
        .collect();

    let mut noisy_signal = clean_signal.clone();
    for (i, value) in noisy_signal.iter_mut().enumerate() {
        if i % 3 == 0 {
            *value += 0.3 * (i as f64 % 2.0 - 0.5);
        }
    }

    println!("Original noisy signal:");
    print_signal(&noisy_signal);

    println!("\n1. Savitzky-Golay (halfwin=2, degree=2):");
    print_signal(&smooth_sg(&noisy_signal, 2, 2)?);

    // Knock out a few samples; the weighted smoother fits around them
    let mut gappy_signal = noisy_signal.clone();
    gappy_signal[5] = f64::NAN;
    gappy_signal[13] = f64::INFINITY;
    println!("\n2. Weighted Savitzky-Golay with gaps at 5 and 13:");
    print_signal(&smooth_wsg(&gappy_signal, 2, 2, None)?);

    println!("\n3. Moving average (halfwin=2), plain and SG-style boundaries:");
    print_signal(&movmean(&gappy_signal, 2, false, None)?);
    print_signal(&movmean(&gappy_signal, 2, true, None)?);

    println!("\n4. Trailing moving average (win_left=2, win_right=0):");
    print_signal(&movmean2(&[4.0, 8.0, f64::NAN, -1.0, -2.0, f64::INFINITY, -1.0], 2, 0, None)?);

    println!("\n5. Row-wise moving average:");
    let mat = DMatrix::from_fn(3, 8, |i, j| (i * 8 + j) as f64);
    println!("{}", movmean_2d(&mat, 3, 0));

    println!("6. Performance test with large dataset:");
    let large_data: Vec<f64> = (0..10000)
        .map(|i| (i as f64 * 0.001).sin() + 0.1 * (i as f64 * 0.01).cos())
        .collect();

    let start = std::time::Instant::now();
    let filter = SavitzkyGolayFilter::new(5, 3)?;
    let _smoothed_large = filter.apply(&large_data)?;
    println!("Processed {} points in {:?}", large_data.len(), start.elapsed());

    Ok(())
}

fn print_signal(signal: &[f64]) {
    for (i, &value) in signal.iter().enumerate() {
        print!("{:7.3}", value);
        if (i + 1) % 8 == 0 {
            println!();
        }
    }
    if signal.len() % 8 != 0 {
        println!();
    }
}
