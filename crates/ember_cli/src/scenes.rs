//! Built-in demo scenes.
//!
//! Scene importers live outside this workspace, so the CLI assembles its
//! test scenes in code.

use anyhow::{bail, Result};
use ember_core::{
    AreaLight, CameraParams, Color, Material, MaterialHandle, Model, ModelId, Plane, PointLight,
    Scene, Sphere, Triangle,
};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const SCENE_NAMES: &[&str] = &["cornell", "spheres"];

pub fn build(name: &str) -> Result<Scene> {
    match name {
        "cornell" => Ok(cornell()),
        "spheres" => Ok(spheres()),
        other => bail!(
            "unknown scene '{}', expected one of: {}",
            other,
            SCENE_NAMES.join(", ")
        ),
    }
}

/// Add the two triangles of quad `a b c d` under `model`.
fn add_quad(scene: &mut Scene, corners: [Vec3; 4], material: MaterialHandle, model: ModelId) {
    let [a, b, c, d] = corners;
    scene.add_triangle(Triangle::new(a, b, c, material), Some(model));
    scene.add_triangle(Triangle::new(a, c, d, material), Some(model));
}

/// Box room with red and green side walls, one glass and one Phong
/// sphere. Geometry is modelled in a unit cube and scaled up by its model.
fn cornell() -> Scene {
    let mut scene = Scene::new("cornell");
    scene.camera = CameraParams::default()
        .with_position(Vec3::new(0.0, 50.0, -170.0), Vec3::new(0.0, 50.0, 0.0), Vec3::Y)
        .with_lens(40.0, 0.0, 1.0);
    scene.options.width = 400;
    scene.options.height = 400;
    scene.options.depth = 5;
    scene.options.samples_per_pixel = 32;
    scene.ambient.constant = Color::splat(0.01);

    let white = scene.add_material(Material::lambertian("white", Color::splat(0.75)));
    let red = scene.add_material(Material::lambertian("red", Color::new(0.75, 0.15, 0.1)));
    let green = scene.add_material(Material::lambertian("green", Color::new(0.15, 0.65, 0.15)));
    let glass = scene.add_material(Material::glass("glass", Color::ONE, 1.5));
    let shiny = scene.add_material(Material::phong(
        "shiny",
        Color::new(0.2, 0.3, 0.6),
        Color::splat(0.5),
        40.0,
    ));

    let room = scene.add_model(Model::new("room", Vec3::new(0.0, 50.0, 0.0), Vec3::splat(50.0)));

    let p = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
    let walls = [
        // Floor
        ([p(-1.0, -1.0, -1.0), p(-1.0, -1.0, 1.0), p(1.0, -1.0, 1.0), p(1.0, -1.0, -1.0)], white),
        // Ceiling
        ([p(-1.0, 1.0, -1.0), p(1.0, 1.0, -1.0), p(1.0, 1.0, 1.0), p(-1.0, 1.0, 1.0)], white),
        // Back
        ([p(-1.0, -1.0, 1.0), p(-1.0, 1.0, 1.0), p(1.0, 1.0, 1.0), p(1.0, -1.0, 1.0)], white),
        // Left
        ([p(-1.0, -1.0, -1.0), p(-1.0, 1.0, -1.0), p(-1.0, 1.0, 1.0), p(-1.0, -1.0, 1.0)], red),
        // Right
        ([p(1.0, -1.0, -1.0), p(1.0, -1.0, 1.0), p(1.0, 1.0, 1.0), p(1.0, 1.0, -1.0)], green),
    ];
    for (corners, material) in walls {
        add_quad(&mut scene, corners, material, room);
    }

    scene.add_sphere(Sphere::new(p(-0.45, -0.6, 0.35), 0.4, shiny), Some(room));
    scene.add_sphere(Sphere::new(p(0.45, -0.6, -0.2), 0.4, glass), Some(room));

    // Lights are given in world space.
    scene.point_lights.push(PointLight {
        intensity: Color::splat(1.0),
        position: Vec3::new(0.0, 90.0, 0.0),
    });
    scene.area_lights.push(AreaLight {
        radiance: Color::splat(12.0),
        position: Vec3::new(-12.0, 99.5, -12.0),
        u: Vec3::new(24.0, 0.0, 0.0),
        v: Vec3::new(0.0, 0.0, 24.0),
    });

    scene
}

/// Random spheres on a ground patch under a large sky light.
fn spheres() -> Scene {
    let mut scene = Scene::new("spheres");
    scene.camera = CameraParams::default()
        .with_position(Vec3::new(0.0, 3.0, -12.0), Vec3::new(0.0, 0.5, 0.0), Vec3::Y)
        .with_lens(35.0, 0.1, 12.0);
    scene.options.width = 480;
    scene.options.height = 320;
    scene.camera.aspect = 480.0 / 320.0;
    scene.options.samples_per_pixel = 16;

    let ground = scene.add_material(Material::lambertian("ground", Color::splat(0.5)));
    scene.add_plane(
        Plane::new(
            Vec3::new(-20.0, 0.0, -20.0),
            Vec3::new(0.0, 0.0, 40.0),
            Vec3::new(40.0, 0.0, 0.0),
            ground,
        ),
        None,
    );

    let mut rng = StdRng::seed_from_u64(2024);
    for a in -3..=3 {
        for b in -2..=2 {
            let center = Vec3::new(
                a as f32 * 2.0 + rng.gen_range(-0.5..0.5),
                0.5,
                b as f32 * 2.0 + rng.gen_range(-0.5..0.5),
            );
            let color = Color::new(rng.gen(), rng.gen(), rng.gen());
            let material = match rng.gen_range(0..10) {
                0..=5 => Material::lambertian(format!("diffuse_{a}_{b}"), color),
                6..=7 => Material::phong(format!("phong_{a}_{b}"), color, Color::splat(0.6), 30.0),
                _ => Material::glass(format!("glass_{a}_{b}"), Color::ONE, 1.5),
            };
            let m = scene.add_material(material);
            scene.add_sphere(Sphere::new(center, 0.5, m), None);
        }
    }

    scene.point_lights.push(PointLight {
        intensity: Color::splat(1.0),
        position: Vec3::new(4.0, 10.0, -4.0),
    });
    scene.area_lights.push(AreaLight {
        radiance: Color::splat(3.0),
        position: Vec3::new(-10.0, 12.0, -10.0),
        u: Vec3::new(20.0, 0.0, 0.0),
        v: Vec3::new(0.0, 0.0, 20.0),
    });

    scene
}
