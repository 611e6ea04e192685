use crate::cmd::Context;
use crate::data::{Employee, Id, NewEmployee, NewVehicle, UpdateEmployee, UpdateVehicle, Vehicle};
use anyhow::{Result, bail};

pub fn run_employees(ctx: &Context) -> Result<()> {
    let employees = ctx.client()?.list_employees()?;
    write_employees(&employees, &mut std::io::stdout())
}

pub fn run_add_employee(ctx: &Context, employee: NewEmployee) -> Result<()> {
    if employee.name.trim().is_empty() || employee.email.trim().is_empty() {
        bail!("an employee needs at least a name and an email");
    }
    ctx.client()?.create_employee(&employee)?;
    println!("Employee {} added.", employee.email);
    Ok(())
}

pub fn run_edit_employee(ctx: &Context, id: &str, employee: UpdateEmployee) -> Result<()> {
    if employee.name.is_empty() || employee.email.is_empty() {
        bail!("an employee needs at least a name and an email");
    }
    let id = Id::new(id);
    ctx.client()?.update_employee(&id, &employee)?;
    match employee.password {
        Some(_) => println!("Employee {id} updated (password changed)."),
        None => println!("Employee {id} updated."),
    }
    Ok(())
}

pub fn run_remove_employee(ctx: &Context, id: &str) -> Result<()> {
    let id = Id::new(id);
    ctx.client()?.delete_employee(&id)?;
    println!("Employee {id} removed.");
    Ok(())
}

pub fn run_vehicles(ctx: &Context) -> Result<()> {
    let vehicles = ctx.client()?.list_vehicles()?;
    write_vehicles(&vehicles, &mut std::io::stdout())
}

pub fn run_add_vehicle(ctx: &Context, brand: &str, model: &str, plate: &str) -> Result<()> {
    let vehicle = NewVehicle::new(brand, model, plate);
    if vehicle.model.is_empty() || vehicle.plate.is_empty() {
        bail!("a vehicle needs a brand or model and a plate");
    }
    ctx.client()?.create_vehicle(&vehicle)?;
    println!("Vehicle {} ({}) added.", vehicle.model, vehicle.plate);
    Ok(())
}

pub fn run_edit_vehicle(ctx: &Context, id: &str, brand: &str, model: &str, plate: &str) -> Result<()> {
    if brand.trim().is_empty() || model.trim().is_empty() || plate.trim().is_empty() {
        bail!("editing a vehicle needs a brand, a model and a plate");
    }
    let id = Id::new(id);
    let vehicle = UpdateVehicle::new(brand, model, plate);
    ctx.client()?.update_vehicle(&id, &vehicle)?;
    println!("Vehicle {id} updated: {} ({}).", vehicle.model, vehicle.plate);
    Ok(())
}

pub fn run_remove_vehicle(ctx: &Context, id: &str) -> Result<()> {
    let id = Id::new(id);
    ctx.client()?.delete_vehicle(&id)?;
    println!("Vehicle {id} removed.");
    Ok(())
}

pub(crate) fn write_employees<W: std::io::Write>(employees: &[Employee], out: &mut W) -> Result<()> {
    writeln!(out, "Employees")?;
    writeln!(out, "---")?;
    writeln!(
        out,
        "  {:<6} {:<26} {:<28} {:<12} {}",
        "ID", "Name", "Email", "License", "Role"
    )?;
    for e in employees {
        writeln!(
            out,
            "  {:<6} {:<26} {:<28} {:<12} {}",
            e.id,
            e.full_name(),
            e.email.as_deref().unwrap_or("-"),
            e.license.as_deref().unwrap_or("-"),
            e.role.as_deref().unwrap_or("-")
        )?;
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {} employee(s)", employees.len())?;
    Ok(())
}

pub(crate) fn write_vehicles<W: std::io::Write>(vehicles: &[Vehicle], out: &mut W) -> Result<()> {
    writeln!(out, "Vehicles")?;
    writeln!(out, "---")?;
    writeln!(out, "  {:<6} {:<14} {:<20} {}", "ID", "Brand", "Model", "Plate")?;
    for v in vehicles {
        let (brand, model) = v.brand_and_model();
        writeln!(out, "  {:<6} {:<14} {:<20} {}", v.id, brand, model, v.plate)?;
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {} vehicle(s)", vehicles.len())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AppSettings;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_write_employees() {
        let employees: Vec<Employee> = serde_json::from_value(json!([
            {"id": 1, "name": "Lucía", "surname": "Pérez", "email": "lucia@demo.com", "license": "C1"},
            {"id": 2, "name": "Marta"}
        ]))
        .unwrap();
        let mut buf = Vec::new();
        write_employees(&employees, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("Lucía Pérez"));
        assert!(out.contains("lucia@demo.com"));
        assert!(out.contains("Marta"));
        assert!(out.contains("Total: 2 employee(s)"));
    }

    #[test]
    fn test_write_vehicles_splits_brand() {
        let vehicles: Vec<Vehicle> = serde_json::from_value(json!([
            {"id": 5, "model": "Iveco Daily 35S", "plate": "1234-ABC"}
        ]))
        .unwrap();
        let mut buf = Vec::new();
        write_vehicles(&vehicles, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let row = out.lines().find(|l| l.contains("1234-ABC")).unwrap();
        assert!(row.contains("Iveco "));
        assert!(row.contains("Daily 35S"));
        assert!(out.contains("Total: 1 vehicle(s)"));
    }

    #[test]
    fn test_add_vehicle_requires_plate() {
        let tmp = TempDir::new().unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), AppSettings::default());
        let err = run_add_vehicle(&ctx, "Iveco", "Daily", " ").unwrap_err();
        assert!(err.to_string().contains("plate"));
    }

    #[test]
    fn test_edit_vehicle_requires_model() {
        let tmp = TempDir::new().unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), AppSettings::default());
        let err = run_edit_vehicle(&ctx, "3", "Ford", " ", "9876-XYZ").unwrap_err();
        assert!(err.to_string().contains("model"));
    }

    #[test]
    fn test_edit_employee_requires_name() {
        let tmp = TempDir::new().unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), AppSettings::default());
        let body = UpdateEmployee::new(" ", "", "ana@demo.com", "", "", None, None);
        let err = run_edit_employee(&ctx, "7", body).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_add_employee_requires_email() {
        let tmp = TempDir::new().unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), AppSettings::default());
        let employee = NewEmployee {
            name: "Ana".to_string(),
            surname: String::new(),
            email: "".to_string(),
            password: "x".to_string(),
            license: String::new(),
            notes: String::new(),
        };
        assert!(run_add_employee(&ctx, employee).is_err());
    }
}
