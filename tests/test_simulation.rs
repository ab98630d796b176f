#[cfg(test)]
mod test_simulation {
    use approx::assert_relative_eq;
    use biosystem::prelude::{
        time_to_index, BioSystem, Part, SimulationError, SimulationSetupBuilder, SystemError, RK4,
        RK5,
    };
    use peroxide::fuga::{BasicODESolver, ODEProblem, ODESolver};

    /// Builds the single reaction `A + E -k> B + E` with A = 10, B = 0, E = 1.
    fn catalysis(k: f64) -> BioSystem {
        let mut system = BioSystem::new();
        system.add_constant("k", k).unwrap();
        system.add_compositor("A", 10.0).unwrap();
        system.add_compositor("B", 0.0).unwrap();
        system.add_compositor("E", 1.0).unwrap();
        system
            .add_part(
                Part::from_laws(
                    "A + E -k> B + E",
                    &["A", "B", "E"],
                    &["-k * A * E", "k * A * E", "0"],
                )
                .unwrap(),
            )
            .unwrap();
        system
    }

    /// Tests mass conservation and the analytic solution of the catalysis scenario.
    ///
    /// E never changes, A + B stays at 10 and A follows `10 * exp(-k * t)`.
    #[test]
    fn test_catalysis_conservation() {
        // ARRANGE
        let mut system = catalysis(0.05);

        // ACT
        let trace = system.run([0.0, 25.0]).unwrap();

        // ASSERT
        assert_eq!(trace.len(), 1000);
        assert_eq!(trace.time[0], 0.0);
        assert_eq!(*trace.time.last().unwrap(), 25.0);

        let a = trace.column("A").unwrap();
        let b = trace.column("B").unwrap();
        let e = trace.column("E").unwrap();

        for (i, t) in trace.time.iter().enumerate() {
            assert_relative_eq!(e[i], 1.0);
            assert_relative_eq!(a[i] + b[i], 10.0, epsilon = 1e-9);
            assert_relative_eq!(a[i], 10.0 * (-0.05 * t).exp(), epsilon = 1e-8);
        }
    }

    /// Tests that a compositor touched by two parts gets the sum of both contributions.
    #[test]
    fn test_additivity() {
        // ARRANGE
        let mut system = catalysis(0.05);
        system.add_constant("d", 0.2).unwrap();
        system
            .add_part(Part::from_laws("B -d>", &["B"], &["-d * B"]).unwrap())
            .unwrap();

        let states = [[10.0, 0.0, 1.0], [3.0, 4.0, 2.0], [0.5, 9.0, 0.1]];

        for state in states {
            // ACT
            let rates = system.evaluate_rates(1.5, &state).unwrap();

            // ASSERT
            let [a, b, e] = state;
            assert_relative_eq!(rates[0], -0.05 * a * e, epsilon = 1e-12);
            assert_relative_eq!(rates[1], 0.05 * a * e - 0.2 * b, epsilon = 1e-12);
            assert_relative_eq!(rates[2], 0.0);
        }
    }

    /// Tests that parts sharing a label are kept apart and both contribute.
    #[test]
    fn test_parts_with_same_label_add_up() {
        // ARRANGE
        let mut system = BioSystem::new();
        system.add_constant("k", 0.1).unwrap();
        system.add_compositor("A", 1.0).unwrap();
        system.add_compositor("B", 2.0).unwrap();
        system
            .add_part(Part::from_laws("decay", &["A"], &["-k * A"]).unwrap())
            .unwrap();
        system
            .add_part(Part::from_laws("decay", &["B"], &["-k * B"]).unwrap())
            .unwrap();
        system
            .add_part(Part::from_laws("decay", &["A"], &["-k * A"]).unwrap())
            .unwrap();

        // ACT
        let rates = system.evaluate_rates(0.0, &[1.0, 2.0]).unwrap();

        // ASSERT
        assert_eq!(system.parts().count(), 3);
        assert_relative_eq!(rates[0], -0.2, epsilon = 1e-12);
        assert_relative_eq!(rates[1], -0.2, epsilon = 1e-12);
    }

    /// Tests that changing a constant after a run is reflected by the next run.
    #[test]
    fn test_cache_invalidation() {
        // ARRANGE
        let mut system = catalysis(0.05);
        let first = system.run([0.0, 10.0]).unwrap();
        assert!(system.is_compiled());
        assert!(system.compositor("A").unwrap().rhs().is_some());

        // ACT
        system.change_constant_value("k", 0.2).unwrap();

        // ASSERT
        assert!(!system.is_compiled());
        assert!(system.compositor("A").unwrap().rhs().is_none());

        let second = system.run([0.0, 10.0]).unwrap();
        assert_relative_eq!(
            first.final_state().unwrap()[0],
            10.0 * (-0.5f64).exp(),
            epsilon = 1e-8
        );
        assert_relative_eq!(
            second.final_state().unwrap()[0],
            10.0 * (-2.0f64).exp(),
            epsilon = 1e-8
        );
    }

    /// Tests that running leaves the compositor values untouched.
    #[test]
    fn test_run_does_not_mutate_values() {
        let mut system = catalysis(0.05);
        system.run([0.0, 5.0]).unwrap();

        assert_eq!(system.current_state(), vec![10.0, 0.0, 1.0]);
    }

    #[test]
    fn test_gamma_is_reserved() {
        for value in [0.0, 1.0, -3.5, f64::MAX] {
            let mut system = BioSystem::new();
            assert!(matches!(
                system.add_constant("gamma", value),
                Err(SystemError::ReservedName(_))
            ));
        }
    }

    #[test]
    fn test_unresolved_symbol_fails_before_integration() {
        // ARRANGE
        let mut system = catalysis(0.05);
        system
            .add_part(Part::from_laws("leak", &["B"], &["-q * B"]).unwrap())
            .unwrap();

        // ACT
        let result = system.run([0.0, 1.0]);

        // ASSERT
        assert!(matches!(
            result,
            Err(SimulationError::System(SystemError::Compilation { .. }))
        ));
    }

    #[test]
    fn test_invalid_interval() {
        let mut system = catalysis(0.05);

        assert!(matches!(
            system.run([5.0, 5.0]),
            Err(SimulationError::InvalidTimeSpan { .. })
        ));
        assert!(matches!(
            system.run([5.0, 1.0]),
            Err(SimulationError::InvalidTimeSpan { .. })
        ));
    }

    /// Tests the driver against peroxide's own solver on the same right-hand side.
    #[test]
    fn test_matches_reference_solver() {
        // ARRANGE
        let setup = SimulationSetupBuilder::default()
            .min_samples(101)
            .samples_per_unit(1.0)
            .substeps(1)
            .build()
            .unwrap();
        let mut system = catalysis(0.05);

        let reference = CatalysisSystem { k: 0.05 };
        let solver = BasicODESolver::new(RK5::default());
        let (t_ref, y_ref) = solver
            .solve(&reference, (0.0, 10.0), 0.1, &[10.0, 0.0, 1.0])
            .expect("Integration failed");

        // ACT
        let trace = system
            .run_with([0.0, 10.0], &setup, RK5::default())
            .unwrap();

        // ASSERT
        let row = t_ref
            .iter()
            .position(|t| (t - 5.0).abs() < 1e-9)
            .expect("Reference solver skipped t = 5");
        let index = time_to_index(&trace.time, 5.0 + 1e-9).unwrap();
        assert_relative_eq!(trace.time[index], 5.0, epsilon = 1e-9);

        let actual = trace.state_at(index).unwrap();
        for (a, e) in actual.iter().zip(y_ref[row].iter()) {
            assert_relative_eq!(*a, *e, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_rk4_and_rk5_agree() {
        let setup = SimulationSetupBuilder::default().build().unwrap();

        let rk4 = catalysis(0.05)
            .run_with([0.0, 25.0], &setup, RK4)
            .unwrap();
        let rk5 = catalysis(0.05)
            .run_with([0.0, 25.0], &setup, RK5::default())
            .unwrap();

        assert_relative_eq!(
            rk4.final_state().unwrap()[0],
            rk5.final_state().unwrap()[0],
            epsilon = 1e-8
        );
    }

    /// Hand-written right-hand side of the catalysis scenario.
    struct CatalysisSystem {
        k: f64,
    }

    impl ODEProblem for CatalysisSystem {
        fn rhs(&self, _t: f64, y: &[f64], dy: &mut [f64]) -> anyhow::Result<()> {
            let rate = self.k * y[0] * y[2];
            dy[0] = -rate;
            dy[1] = rate;
            dy[2] = 0.0;

            Ok(())
        }
    }
}
