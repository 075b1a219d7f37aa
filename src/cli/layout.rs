use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::responsive::{Breakpoints, Responsive, Viewport};
use crate::settings::load_settings;

pub fn run(width: u32, height: Option<u32>) -> Result<()> {
    let settings = load_settings();
    let viewport = Viewport {
        width,
        height: height.unwrap_or(Viewport::default().height),
    };
    println!("{}", render(viewport, settings.breakpoints));
    Ok(())
}

fn yes_no(flag: bool) -> Cell {
    if flag {
        Cell::new("sim".green())
    } else {
        Cell::new("não")
    }
}

pub fn render(viewport: Viewport, breakpoints: Breakpoints) -> String {
    let r = Responsive::with_viewport(breakpoints, viewport);
    let flags = r.flags();

    let mut table = Table::new();
    table.set_header(vec!["Propriedade", "Valor"]);
    table.add_row(vec![Cell::new("mobile"), yes_no(r.is_mobile())]);
    table.add_row(vec![Cell::new("tablet"), yes_no(r.is_tablet())]);
    table.add_row(vec![Cell::new("desktop"), yes_no(r.is_desktop())]);
    table.add_row(vec![Cell::new("xl"), yes_no(flags.is_xl)]);
    table.add_row(vec![Cell::new("2xl"), yes_no(flags.is_2xl)]);
    table.add_row(vec![Cell::new("colunas"), Cell::new(r.columns_grid())]);
    table.add_row(vec![Cell::new("empilhar"), yes_no(r.should_stack_vertically())]);
    table.add_row(vec![Cell::new("compacto"), yes_no(r.should_use_compact_layout())]);

    let vp = r.viewport();
    format!("Viewport {}x{}\n{table}", vp.width, vp.height)
}
