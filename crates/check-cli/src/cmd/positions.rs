use std::path::Path;

use anyhow::{bail, Context, Result};
use check_client::{CalibrationController, LocalBankApi};
use check_template::{
    default_positions, merge_positions, parse_positions, serialize_positions, BankId,
    BankPositions, FieldPosition, FieldRole, JsonFileStorage, LayoutConfig, PositionProperty,
};

use super::open_store;

type LocalController = CalibrationController<LocalBankApi<JsonFileStorage>>;

/// Calibration controller over the local store with bank `id` selected
async fn local_controller(
    store_path: &Path,
    layout: &LayoutConfig,
    id: BankId,
) -> Result<LocalController> {
    let api = LocalBankApi::new(open_store(store_path)?);
    let mut controller = CalibrationController::new(api, layout.clone());
    controller.load(Some(&id.to_string())).await?;

    if controller.selected_bank().map(|b| b.id) != Some(id) {
        bail!("Bank {id} not found");
    }
    Ok(controller)
}

fn print_positions(positions: &BankPositions) {
    for role in FieldRole::ALL {
        match positions.get(role) {
            Some(p) => println!(
                "{:<20} x={:<5} y={:<5} width={:<5} fontSize={}",
                role.key(),
                p.x,
                p.y,
                p.width,
                p.font_size
            ),
            None => println!("{:<20} -", role.key()),
        }
    }
}

pub fn cmd_positions_show(store_path: &Path, id: BankId, json: bool) -> Result<()> {
    let store = open_store(store_path)?;
    let bank = store.get_bank(id)?;

    if json {
        println!("{}", serialize_positions(&bank.positions));
    } else {
        println!("{} ({})", bank.name, bank.code);
        print_positions(&bank.positions);
    }
    Ok(())
}

/// Change one property of one field, the way the calibration tool does
pub async fn cmd_positions_set(
    store_path: &Path,
    layout: &LayoutConfig,
    id: BankId,
    field: FieldRole,
    property: PositionProperty,
    value: i32,
) -> Result<()> {
    let mut controller = local_controller(store_path, layout, id).await?;
    controller
        .edit(field, property, value)
        .with_context(|| format!("cannot set {field} {property:?} of bank {id}"))?;
    controller.save().await?;

    if let Some(position) = controller.selected_bank().and_then(|b| b.positions.get(field)) {
        println!(
            "{field}: x={} y={} width={} fontSize={}",
            position.x, position.y, position.width, position.font_size
        );
    }
    Ok(())
}

/// Turn the second amount line on or off
pub async fn cmd_positions_second_line(
    store_path: &Path,
    layout: &LayoutConfig,
    id: BankId,
    enabled: bool,
) -> Result<()> {
    let mut controller = local_controller(store_path, layout, id).await?;
    let current = controller
        .selected_bank()
        .is_some_and(|b| b.positions.has_second_line());

    if current == enabled {
        println!("Second line already {}", on_off(enabled));
        return Ok(());
    }

    controller.toggle_second_line()?;
    controller.save().await?;

    let line2 = controller
        .selected_bank()
        .and_then(|b| b.positions.amount_in_words_line2);
    match line2 {
        Some(p) => println!(
            "Second line on: x={} y={} width={} fontSize={}",
            p.x, p.y, p.width, p.font_size
        ),
        None => println!("Second line off"),
    }
    Ok(())
}

/// Replace a whole field rectangle, configuring optional fields
pub fn cmd_positions_place(
    store_path: &Path,
    id: BankId,
    field: FieldRole,
    position: FieldPosition,
) -> Result<()> {
    if !position.is_valid() {
        bail!("width and font size must be positive");
    }

    let mut store = open_store(store_path)?;
    let mut positions = store.get_bank(id)?.positions;
    positions.set(field, position);
    store.update_positions(id, positions)?;
    println!("{field} placed");
    Ok(())
}

/// Remove an optional field
pub fn cmd_positions_clear(store_path: &Path, id: BankId, field: FieldRole) -> Result<()> {
    if !field.is_optional() {
        bail!("{field} is required and cannot be cleared");
    }

    let mut store = open_store(store_path)?;
    let mut positions = store.get_bank(id)?.positions;
    positions.clear(field);
    store.update_positions(id, positions)?;
    println!("{field} cleared");
    Ok(())
}

/// Load positions from a JSON file; missing or invalid fields get defaults
pub fn cmd_positions_import(store_path: &Path, id: BankId, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let partial = parse_positions(&content);
    if partial.is_empty() {
        bail!("no valid positions in {}", file.display());
    }

    let mut store = open_store(store_path)?;
    let bank = store.update_positions(id, merge_positions(partial))?;
    print_positions(&bank.positions);
    Ok(())
}

pub fn cmd_positions_reset(store_path: &Path, id: BankId) -> Result<()> {
    let mut store = open_store(store_path)?;
    store.update_positions(id, default_positions())?;
    println!("Positions of bank {id} reset to defaults");
    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
