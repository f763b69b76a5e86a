// Human readable duration for progress output

pub fn format_seconds(seconds: f64) -> String {
  if seconds < 1.0 {
    format!("{:.0}ms", seconds * 1000.0)
  } else if seconds < 60.0 {
    format!("{seconds:.1}s")
  } else {
    let minutes = (seconds / 60.0).floor();
    format!("{minutes:.0}m{:02.0}s", seconds - minutes * 60.0)
  }
}


// Fixed precision that stays readable for tiny and huge values

pub fn format_metric(value: f64) -> String {
  let magnitude = value.abs();
  if value == 0.0 || (1e-3..1e5).contains(&magnitude) {
    format!("{value:.4}")
  } else {
    format!("{value:.3e}")
  }
}


// [=====>....] style bar

pub fn render_bar(done: usize, total: usize, width: usize) -> String {
  let filled = if total == 0 { width } else { (done.min(total) * width) / total };
  let mut bar = String::with_capacity(width + 2);
  bar.push('[');
  for i in 0..width {
    let c = if i + 1 < filled || (i + 1 == filled && done >= total) {
      '='
    } else if i + 1 == filled {
      '>'
    } else {
      '.'
    };
    bar.push(c);
  }
  bar.push(']');
  bar
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn seconds() {
    assert_eq!(format_seconds(0.25), "250ms");
    assert_eq!(format_seconds(3.21), "3.2s");
    assert_eq!(format_seconds(125.0), "2m05s");
  }

  #[test]
  fn metrics() {
    assert_eq!(format_metric(0.5), "0.5000");
    assert_eq!(format_metric(0.0), "0.0000");
    assert_eq!(format_metric(1e-5), "1.000e-5");
  }

  #[test]
  fn bar() {
    assert_eq!(render_bar(0, 4, 4), "[....]");
    assert_eq!(render_bar(2, 4, 4), "[=>..]");
    assert_eq!(render_bar(4, 4, 4), "[====]");
    assert_eq!(render_bar(9, 4, 4), "[====]");
  }
}
