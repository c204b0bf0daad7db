fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure()
        .build_server(false) // The exporter is a client of every backend
        .compile_protos(
            &[
                "proto/onos/e2t/e2/v1beta1/subscription.proto",
                "proto/onos/topo/topo.proto",
                "proto/perftools/profiles/profile.proto",
            ],
            &["proto/", "/usr/include"],
        )?;
    Ok(())
}
