//! Gnuplot script generation for swept field tables

use anyhow::Result;
use minijinja::{context, Environment};

use crate::sweep::SweepRegion;

const GNUPLOT_TEMPLATE: &str = r##"# Mapped magnetic field: {{ title }}
# Generated: {{ timestamp }}
# Columns: x y z bx by bz ({{ length_unit }}, {{ field_unit }} x {{ scale }})

set title '{{ title }}'
set grid
set size ratio -1
set view equal xyz
set xyplane at 0
set xrange [{{ "%.6f"|format(xmin) }}:{{ "%.6f"|format(xmax) }}]
set yrange [{{ "%.6f"|format(ymin) }}:{{ "%.6f"|format(ymax) }}]
set zrange [{{ "%.6f"|format(zmin) }}:{{ "%.6f"|format(zmax) }}]
set xlabel 'x ({{ length_unit }})'
set ylabel 'y ({{ length_unit }})'
set zlabel 'z ({{ length_unit }})'

splot '{{ data_file }}' u 1:2:3:4:5:6 notitle with vectors
{% if projection %}
pause mouse close

set xlabel 'x ({{ length_unit }})'
set ylabel 'z ({{ length_unit }})'
set xrange [{{ "%.6f"|format(xmin) }}:{{ "%.6f"|format(xmax) }}]
set yrange [{{ "%.6f"|format(zmin) }}:{{ "%.6f"|format(zmax) }}]
plot '{{ data_file }}' u 1:3:4:6 notitle with vectors
{% endif %}
pause mouse close
"##;

/// Options for the generated plot script
#[derive(Debug, Clone)]
pub struct PlotConfig {
    pub title: String,
    pub length_unit: String,
    pub field_unit: String,
    /// Arrow scale applied when the table was written
    pub scale: f64,
    /// Also draw the x-z projection
    pub projection: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            title: "Mapped magnetic field".to_string(),
            length_unit: "m".to_string(),
            field_unit: "mG".to_string(),
            scale: 1.0,
            projection: true,
        }
    }
}

/// Render a gnuplot script drawing the table in `data_file` as vectors
pub fn generate_gnuplot_script(
    data_file: &str,
    region: &SweepRegion,
    config: &PlotConfig,
) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("field", GNUPLOT_TEMPLATE)?;
    let template = env.get_template("field")?;

    let (min, max) = (&region.min, &region.max);
    let output = template.render(context! {
        title => config.title,
        timestamp => chrono::Utc::now().to_rfc3339(),
        length_unit => config.length_unit,
        field_unit => config.field_unit,
        scale => config.scale,
        data_file => data_file,
        projection => config.projection,
        xmin => min.x,
        xmax => max.x,
        ymin => min.y,
        ymax => max.y,
        zmin => min.z,
        zmax => max.z,
    })?;

    Ok(output)
}
